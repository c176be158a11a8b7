//! Closed enumerations used across record kinds.
//!
//! Every enumeration serializes as its `snake_case` name and parses
//! case-insensitively (`-` is accepted in place of `_`).  Unknown values are
//! reported as [`ValidationError::UnknownVariant`].

use serde::{Deserialize, Serialize};

use crate::ValidationError;

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $field:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
                match normalized.as_str() {
                    $( $text => Ok($name::$variant), )+
                    _ => Err(ValidationError::UnknownVariant {
                        field: $field,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// Conversational context a memory was captured in.
    Channel as "channel" {
        StreamChat => "stream_chat",
        Telegram => "telegram",
        X => "x",
        Discord => "discord",
        Coding => "coding",
        #[default]
        Internal => "internal",
    }
}

string_enum! {
    ThoughtType as "thought type" {
        #[default]
        Idea => "idea",
        Reflection => "reflection",
        Dream => "dream",
        Observation => "observation",
        Creative => "creative",
        Frustration => "frustration",
        Gratitude => "gratitude",
        Insight => "insight",
        Question => "question",
        ShowerThought => "shower_thought",
    }
}

string_enum! {
    Mood as "mood" {
        Happy => "happy",
        Excited => "excited",
        Curious => "curious",
        Calm => "calm",
        Content => "content",
        Tired => "tired",
        Frustrated => "frustrated",
        Sad => "sad",
        Anxious => "anxious",
        Grateful => "grateful",
        Playful => "playful",
        #[default]
        Neutral => "neutral",
    }
}

string_enum! {
    TodoStatus as "todo status" {
        #[default]
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
    }
}

string_enum! {
    /// Todo urgency.  Orders most urgent first (`P0 < P4`).
    Priority as "priority" {
        P0 => "p0",
        P1 => "p1",
        #[default]
        P2 => "p2",
        P3 => "p3",
        P4 => "p4",
    }
}

string_enum! {
    TodoCategory as "todo category" {
        Feature => "feature",
        Bug => "bug",
        Content => "content",
        Community => "community",
        Learning => "learning",
        Infra => "infra",
        Personal => "personal",
        #[default]
        Other => "other",
    }
}

string_enum! {
    JournalType as "journal type" {
        #[default]
        DailySummary => "daily_summary",
        Milestone => "milestone",
        MoodCheck => "mood_check",
        CommunityReflection => "community_reflection",
        WeeklyRecap => "weekly_recap",
    }
}

string_enum! {
    KnowledgeType as "knowledge type" {
        #[default]
        Fact => "fact",
        Insight => "insight",
        Skill => "skill",
        Lesson => "lesson",
        Technique => "technique",
        Pattern => "pattern",
        Reference => "reference",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_parses_case_insensitively() {
        assert_eq!("Telegram".parse::<Channel>(), Ok(Channel::Telegram));
        assert_eq!("stream-chat".parse::<Channel>(), Ok(Channel::StreamChat));
        assert_eq!(" x ".parse::<Channel>(), Ok(Channel::X));
    }

    #[test]
    fn unknown_channel_is_validation_error() {
        let err = "myspace".parse::<Channel>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownVariant {
                field: "channel",
                value: "myspace".into()
            }
        );
    }

    #[test]
    fn serde_name_matches_display() {
        for t in ThoughtType::ALL {
            let json = serde_json::to_string(t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
        for s in TodoStatus::ALL {
            let json = serde_json::to_string(s).unwrap();
            assert_eq!(json, format!("\"{s}\""));
        }
    }

    #[test]
    fn priority_orders_most_urgent_first() {
        let mut ps = vec![Priority::P3, Priority::P0, Priority::P4, Priority::P1];
        ps.sort();
        assert_eq!(ps, vec![Priority::P0, Priority::P1, Priority::P3, Priority::P4]);
    }

    #[test]
    fn defaults_are_stable() {
        assert_eq!(Mood::default(), Mood::Neutral);
        assert_eq!(TodoStatus::default(), TodoStatus::Pending);
        assert_eq!(Priority::default(), Priority::P2);
        assert_eq!(Channel::default(), Channel::Internal);
    }
}
