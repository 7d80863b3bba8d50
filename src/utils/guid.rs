//! Random GUIDs in the 36-character form stored in `char(36)` columns

use uuid::{Builder, Uuid};

/// Generates a random version 4 GUID
pub fn guid_v4() -> String {
    Uuid::new_v4().to_string()
}

/// Builds a version 4 GUID from caller-supplied bytes
///
/// The version and variant bits are overwritten; the other 122 bits are
/// taken from `bytes` unchanged.
pub fn guid_from_bytes(bytes: [u8; 16]) -> String {
    Builder::from_random_bytes(bytes).into_uuid().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid_v4_shape() {
        let guid = guid_v4();
        assert_eq!(guid.len(), 36);
        assert_eq!(guid.as_bytes()[14], b'4');
        assert_ne!(guid, guid_v4());
    }

    #[test]
    fn test_guid_from_bytes_sets_version_and_variant() {
        assert_eq!(
            guid_from_bytes([0; 16]),
            "00000000-0000-4000-8000-000000000000"
        );
        assert_eq!(
            guid_from_bytes([0xff; 16]),
            "ffffffff-ffff-4fff-bfff-ffffffffffff"
        );
    }
}
