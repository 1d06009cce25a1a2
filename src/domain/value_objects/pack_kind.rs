//! Pack kind value object

use std::fmt;

/// The two kinds of pack a build can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PackKind {
    Behavior,
    Resource,
}

impl PackKind {
    /// Config section name, log span name and archive root folder
    pub fn label(self) -> &'static str {
        match self {
            PackKind::Behavior => "behavior_pack",
            PackKind::Resource => "resource_pack",
        }
    }
}

impl fmt::Display for PackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_config_sections() {
        assert_eq!(PackKind::Behavior.label(), "behavior_pack");
        assert_eq!(PackKind::Resource.to_string(), "resource_pack");
    }
}
