//! File picker and drag-and-drop input, unified into one validated event.
//!
//! Both input paths end in [`DropTargetAdapter::receive`], which checks type
//! and size before anything reaches the selection store. Hover state is
//! purely presentational and is reset on drop, drag-leave and rejection.

use std::collections::BTreeSet;

use crate::config::ValidationConfig;
use crate::error::ValidationError;
use crate::model::LocalFile;
use crate::registry::SlotCode;

/// Extension to MIME type table used when the browser reports no type.
const EXTENSION_MIME_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
];

/// Guess a MIME type from a file name extension.
pub fn mime_from_extension(filename: &str) -> Option<&'static str> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    EXTENSION_MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// Where a file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// `change` event of a file input
    Picker,
    /// `drop` event on a slot
    Drop,
}

/// Validating input adapter for all slots of a session.
#[derive(Debug)]
pub struct DropTargetAdapter {
    validation: ValidationConfig,
    hovered: BTreeSet<SlotCode>,
}

impl DropTargetAdapter {
    pub fn new(validation: ValidationConfig) -> Self {
        Self {
            validation,
            hovered: BTreeSet::new(),
        }
    }

    /// A drag entered or moved over a slot.
    pub fn drag_enter(&mut self, slot: SlotCode) {
        self.hovered.insert(slot);
    }

    /// A drag left a slot without dropping.
    pub fn drag_leave(&mut self, slot: SlotCode) {
        self.hovered.remove(&slot);
    }

    pub fn is_hovered(&self, slot: SlotCode) -> bool {
        self.hovered.contains(&slot)
    }

    /// Forget all hover state.
    pub fn reset(&mut self) {
        self.hovered.clear();
    }

    /// Accept the first of `files` for `slot` if it passes validation.
    ///
    /// The returned file carries a normalized MIME type. Hover state for the
    /// slot is cleared whatever the outcome.
    pub fn receive(
        &mut self,
        slot: SlotCode,
        source: InputSource,
        files: Vec<LocalFile>,
    ) -> Result<LocalFile, ValidationError> {
        self.hovered.remove(&slot);

        let extra = files.len().saturating_sub(1);
        let Some(file) = files.into_iter().next() else {
            log::warn!("{:?} on {} carried no file", source, slot);
            return Err(ValidationError::NoFile);
        };
        if extra > 0 {
            log::debug!("{:?} on {}: ignoring {} extra files", source, slot, extra);
        }

        match self.validate(file) {
            Ok(file) => {
                log::info!(
                    "{:?} on {}: accepted {} ({}, {} bytes)",
                    source,
                    slot,
                    file.name,
                    file.mime_type,
                    file.byte_size
                );
                Ok(file)
            }
            Err(e) => {
                log::warn!("{:?} on {}: rejected: {}", source, slot, e);
                Err(e)
            }
        }
    }

    /// Check type and size, filling in a missing MIME type from the name.
    pub fn validate(&self, mut file: LocalFile) -> Result<LocalFile, ValidationError> {
        let mut mime = file.mime_type.trim().to_ascii_lowercase();
        if mime.is_empty() {
            mime = mime_from_extension(&file.name).unwrap_or_default().to_string();
        }

        let accepted = self
            .validation
            .accepted_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&mime));
        if !accepted {
            return Err(ValidationError::unsupported_type(
                file.mime_type.clone(),
                &self.validation.accepted_mime_types,
            ));
        }

        if file.byte_size > self.validation.max_bytes {
            return Err(ValidationError::TooLarge {
                byte_size: file.byte_size,
                max_bytes: self.validation.max_bytes,
            });
        }

        file.mime_type = mime;
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EntityClass;

    const MIB: u64 = 1024 * 1024;

    fn slot(code: &str) -> SlotCode {
        EntityClass::UserStats.registry().lookup(code).unwrap()
    }

    fn file(name: &str, mime: &str, byte_size: u64) -> LocalFile {
        LocalFile::new(name, mime, byte_size, Vec::new())
    }

    fn adapter() -> DropTargetAdapter {
        DropTargetAdapter::new(ValidationConfig::default())
    }

    #[test]
    fn test_accepts_jpeg_under_limit() {
        let mut adapter = adapter();
        let accepted = adapter
            .receive(slot("PAS"), InputSource::Drop, vec![file("a.jpg", "image/jpeg", 2 * MIB)])
            .unwrap();
        assert_eq!(accepted.name, "a.jpg");
    }

    #[test]
    fn test_rejects_oversized_png() {
        let mut adapter = adapter();
        let result = adapter.receive(
            slot("TAC"),
            InputSource::Drop,
            vec![file("big.png", "image/png", 10 * MIB)],
        );
        assert_eq!(
            result.unwrap_err(),
            ValidationError::TooLarge {
                byte_size: 10 * MIB,
                max_bytes: 5 * MIB
            }
        );
    }

    #[test]
    fn test_limit_is_inclusive() {
        let adapter = adapter();
        assert!(adapter.validate(file("ok.png", "image/png", 5 * MIB)).is_ok());
        assert!(adapter.validate(file("no.png", "image/png", 5 * MIB + 1)).is_err());
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let adapter = adapter();
        let err = adapter
            .validate(file("doc.pdf", "application/pdf", 100))
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedType { .. }));
        assert!(err.to_string().contains("application/pdf"));
    }

    #[test]
    fn test_empty_mime_inferred_from_extension() {
        let adapter = adapter();
        let accepted = adapter.validate(file("photo.WEBP", "", 100)).unwrap();
        assert_eq!(accepted.mime_type, "image/webp");
        assert!(adapter.validate(file("notes", "", 100)).is_err());
    }

    #[test]
    fn test_mime_case_normalized() {
        let adapter = adapter();
        let accepted = adapter.validate(file("a.png", "IMAGE/PNG", 100)).unwrap();
        assert_eq!(accepted.mime_type, "image/png");
    }

    #[test]
    fn test_empty_selection_rejected() {
        let mut adapter = adapter();
        assert!(matches!(
            adapter.receive(slot("SPD"), InputSource::Picker, Vec::new()),
            Err(ValidationError::NoFile)
        ));
    }

    #[test]
    fn test_hover_reset_on_drop_leave_and_rejection() {
        let mut adapter = adapter();
        let spd = slot("SPD");

        adapter.drag_enter(spd);
        assert!(adapter.is_hovered(spd));
        adapter.drag_leave(spd);
        assert!(!adapter.is_hovered(spd));

        adapter.drag_enter(spd);
        let _ = adapter.receive(spd, InputSource::Drop, vec![file("x.txt", "text/plain", 1)]);
        assert!(!adapter.is_hovered(spd));

        adapter.drag_enter(spd);
        let _ = adapter.receive(spd, InputSource::Drop, vec![file("x.png", "image/png", 1)]);
        assert!(!adapter.is_hovered(spd));
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_from_extension("a.JPG"), Some("image/jpeg"));
        assert_eq!(mime_from_extension("dir.v2/file"), None);
        assert_eq!(mime_from_extension("noext"), None);
    }
}
