use std::fmt::{self, Display};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LinkType {
    Track,
    Album,
    /// shortened redirect link, the target is unknown until expanded
    Short,
}

impl LinkType {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LinkType::Track => "track",
            LinkType::Album => "album",
            LinkType::Short => "short",
        }
    }

    pub fn parse(s: &str) -> Option<LinkType> {
        match s {
            "track" => Some(LinkType::Track),
            "album" => Some(LinkType::Album),
            "short" => Some(LinkType::Short),
            _ => None,
        }
    }
}

impl Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sighting of a music link in a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLink {
    pub id: i64,
    // snowflakes of where the link was posted
    pub message: u64,
    pub channel: u64,
    pub guild: u64,

    pub link: String,
    pub link_type: Option<LinkType>,
    pub acknowledged: bool,
}

/// A link found in a message that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub link: String,
    pub link_type: Option<LinkType>,
}

impl NewLink {
    pub fn new(link: impl Into<String>, link_type: Option<LinkType>) -> NewLink {
        NewLink {
            link: link.into(),
            link_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_type_parse() {
        for t in [LinkType::Track, LinkType::Album, LinkType::Short] {
            assert_eq!(LinkType::parse(t.as_str()), Some(t));
        }
        assert_eq!(LinkType::parse("playlist"), None);
        assert_eq!(LinkType::parse(""), None);
    }
}
