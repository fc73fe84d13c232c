use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse scan milestones handed to the progress callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    Configuring,
    ReadingFriendList,
    FriendListRead { count: usize },
    ReadingMutualFriends { index: usize, total: usize, name: String },
    MutualFriendsRead { name: String, count: usize },
    Reconciled { unresolved: usize },
    Finished,
}

impl fmt::Display for ScanEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanEvent::Configuring => write!(f, "Configuring scanner"),
            ScanEvent::ReadingFriendList => write!(f, "Getting list of friends"),
            ScanEvent::FriendListRead { count } => {
                write!(f, "Start reading mutual connections between your {count} friends")
            }
            ScanEvent::ReadingMutualFriends { index, total, name } => {
                write!(f, "Reading mutual friends with {name}. ({index} of {total})")
            }
            ScanEvent::MutualFriendsRead { count, .. } => {
                write!(f, "  Number of mutual friends: {count}")
            }
            ScanEvent::Reconciled { unresolved } => {
                write!(f, "Matched scraped profiles ({unresolved} left without id)")
            }
            ScanEvent::Finished => write!(f, "Finished scanning network"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let event = ScanEvent::ReadingMutualFriends {
            index: 2,
            total: 10,
            name: "Ada".to_string(),
        };
        assert_eq!(event.to_string(), "Reading mutual friends with Ada. (2 of 10)");
        assert_eq!(ScanEvent::Finished.to_string(), "Finished scanning network");
    }
}
