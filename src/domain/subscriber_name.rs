use unicode_segmentation::UnicodeSegmentation;

const MAX_CHAR_LENGHT: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SubscriberName(String);

impl SubscriberName {
    /// Display names are free text: a blank name counts as "no name given" and long names are
    /// cut at `MAX_CHAR_LENGHT` graphemes instead of being rejected.
    pub fn parse(name: Option<&str>) -> Option<SubscriberName> {
        let name = name?.trim();

        if name.is_empty() {
            return None;
        }

        Some(Self(name.graphemes(true).take(MAX_CHAR_LENGHT).collect()))
    }

    /// Wraps a name read back from the subscribers table without re-checking it.
    pub fn from_stored(name: String) -> SubscriberName {
        Self(name)
    }
}

impl AsRef<str> for SubscriberName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
