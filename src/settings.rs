//! Options for the scroll-sync coordinator.
//!
//! Settings arrive either as a Lua table from the plugin's `setup()` or as
//! JSON. Every field is optional; missing fields take their defaults.

use crate::error::Result;
use crate::scroll::Align;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Whether scrolling one view follows in the other. Off until the user
    /// links the views.
    pub link_scroll: bool,

    /// Alignment used when a view passively follows its partner.
    pub follow_align: Align,

    /// Alignment used for deliberate "jump to hunk" navigation.
    pub navigate_align: Align,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            link_scroll: false,
            follow_align: Align::Top,
            navigate_align: Align::Center,
        }
    }
}

impl SyncSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(SyncSettings::from_json("{}").unwrap(), SyncSettings::default());
    }

    #[test]
    fn partial_override() {
        let settings =
            SyncSettings::from_json(r#"{"link_scroll": true, "navigate_align": "nearest"}"#)
                .unwrap();
        assert_eq!(
            settings,
            SyncSettings {
                link_scroll: true,
                follow_align: Align::Top,
                navigate_align: Align::Nearest,
            }
        );
    }

    #[test]
    fn unknown_alignment_is_rejected() {
        let err = SyncSettings::from_json(r#"{"follow_align": "bottom"}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
