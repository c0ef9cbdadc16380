/// Unit phase definitions for tracking pagination progress
///
/// A unit walks `Start → ListFetch → ParseList → FanOutContent → ListFetch …`
/// until it reaches `Done`.
use std::fmt;

/// Represents where a unit's crawl loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitPhase {
    /// Unit created, backend not yet used
    Start,

    /// Fetching the current list page
    ListFetch,

    /// Extracting list items from the fetched list page
    ParseList,

    /// Content fetches for the current page are in flight
    FanOutContent,

    /// Pagination finished; no further list fetches
    Done,
}

impl UnitPhase {
    /// Returns true if this is the terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if `next` is a legal successor of this phase
    ///
    /// `ListFetch → Done` covers an empty list fetch and the page cap;
    /// `ParseList → Done` covers a page that yielded no items.
    pub fn can_transition_to(&self, next: UnitPhase) -> bool {
        matches!(
            (self, next),
            (Self::Start, Self::ListFetch)
                | (Self::Start, Self::Done)
                | (Self::ListFetch, Self::ParseList)
                | (Self::ListFetch, Self::Done)
                | (Self::ParseList, Self::FanOutContent)
                | (Self::ParseList, Self::Done)
                | (Self::FanOutContent, Self::ListFetch)
                | (Self::FanOutContent, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::ListFetch => "list_fetch",
            Self::ParseList => "parse_list",
            Self::FanOutContent => "fan_out_content",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for UnitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a unit's pagination loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The adapter reported no more pages (empty page or exhausted range)
    Exhausted,

    /// A list page fetch produced nothing; end of data and a transient
    /// failure look the same here
    EmptyListFetch,

    /// The configured page cap was reached
    PageCap,

    /// The fetch backend for the unit could not be opened
    BackendUnavailable,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exhausted => "exhausted",
            Self::EmptyListFetch => "empty_list_fetch",
            Self::PageCap => "page_cap",
            Self::BackendUnavailable => "backend_unavailable",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(UnitPhase::Done.is_terminal());
        assert!(!UnitPhase::Start.is_terminal());
        assert!(!UnitPhase::ListFetch.is_terminal());
        assert!(!UnitPhase::ParseList.is_terminal());
        assert!(!UnitPhase::FanOutContent.is_terminal());
    }

    #[test]
    fn test_pagination_cycle() {
        assert!(UnitPhase::Start.can_transition_to(UnitPhase::ListFetch));
        assert!(UnitPhase::ListFetch.can_transition_to(UnitPhase::ParseList));
        assert!(UnitPhase::ParseList.can_transition_to(UnitPhase::FanOutContent));
        assert!(UnitPhase::FanOutContent.can_transition_to(UnitPhase::ListFetch));
    }

    #[test]
    fn test_done_is_absorbing() {
        for next in [
            UnitPhase::Start,
            UnitPhase::ListFetch,
            UnitPhase::ParseList,
            UnitPhase::FanOutContent,
            UnitPhase::Done,
        ] {
            assert!(!UnitPhase::Done.can_transition_to(next));
        }
    }

    #[test]
    fn test_no_skipping_parse() {
        assert!(!UnitPhase::ListFetch.can_transition_to(UnitPhase::FanOutContent));
        assert!(!UnitPhase::Start.can_transition_to(UnitPhase::ParseList));
        assert!(!UnitPhase::ParseList.can_transition_to(UnitPhase::ListFetch));
    }

    #[test]
    fn test_display() {
        assert_eq!(UnitPhase::FanOutContent.to_string(), "fan_out_content");
        assert_eq!(StopReason::EmptyListFetch.to_string(), "empty_list_fetch");
    }
}
