//! Slash-command parsing.
//!
//! A line is split into words, honouring double quotes.  Words of the form
//! `key=value` are options; everything else is positional.  Free text (a
//! memory's content, a recall query, …) is the remaining positional words
//! joined by single spaces, so quoting is only needed inside option values:
//!
//! ```text
//! /store stream_chat chat picked the next game importance=0.8
//! /relate viewer42 note="first raid!" affection=+0.3
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;

use mnemo_memory::relationships::PeopleOrder;
use mnemo_types::{
    AffectionChange, Channel, JournalType, KnowledgeType, Mood, Priority, RecordKind,
    ThoughtType, TodoCategory, TodoStatus,
};
use uuid::Uuid;

/// One parsed REPL command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Quit,
    Stats,
    Store {
        channel: Channel,
        content: String,
        importance: Option<f32>,
    },
    Recall {
        query: String,
        channel: Option<Channel>,
        limit: Option<usize>,
        threshold: Option<f32>,
    },
    Summarize {
        channel: Channel,
        hours: Option<u32>,
        limit: Option<usize>,
    },
    Reflect {
        query: String,
        limit: Option<usize>,
        threshold: Option<f32>,
    },
    Context {
        channel: Channel,
        message: String,
    },
    Prune {
        days: Option<u32>,
        importance: Option<f32>,
    },
    Relate {
        person_id: String,
        note: Option<String>,
        affection: Option<AffectionChange>,
        relationship_type: Option<String>,
        moment: Option<String>,
    },
    People {
        order: PeopleOrder,
        limit: Option<usize>,
    },
    Person {
        person_id: String,
    },
    Think {
        thought_type: ThoughtType,
        content: String,
        mood: Option<Mood>,
        importance: Option<f32>,
    },
    Thoughts {
        thought_type: Option<ThoughtType>,
        limit: Option<usize>,
    },
    Journal {
        journal_type: JournalType,
        content: String,
        mood: Option<Mood>,
        energy: Option<f32>,
    },
    JournalRecent {
        limit: Option<usize>,
    },
    Learn {
        topic: String,
        content: String,
        knowledge_type: Option<KnowledgeType>,
        source: Option<String>,
        confidence: Option<f32>,
        tags: Vec<String>,
    },
    Knowledge {
        query: String,
        topic: Option<String>,
        limit: Option<usize>,
        threshold: Option<f32>,
    },
    TodoAdd {
        title: String,
        description: Option<String>,
        priority: Option<Priority>,
        category: Option<TodoCategory>,
        project: Option<String>,
    },
    TodoList {
        status: Option<TodoStatus>,
        project: Option<String>,
    },
    TodoDone {
        id: Uuid,
    },
    TodoUpdate {
        id: Uuid,
        status: Option<TodoStatus>,
        priority: Option<Priority>,
        category: Option<TodoCategory>,
        title: Option<String>,
        project: Option<String>,
    },
    TodoRemove {
        id: Uuid,
    },
    Forget {
        kind: RecordKind,
        id: Uuid,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Tokenizer
// ─────────────────────────────────────────────────────────────────────────────

/// Split `line` on whitespace; double quotes group words and are removed.
pub fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_quotes {
        return Err("unterminated quote".to_string());
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Positional words and `key=value` options of one command line.
#[derive(Debug, Default)]
struct Args {
    positional: Vec<String>,
    options: BTreeMap<String, String>,
}

fn is_option_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_lowercase() || c == '_')
}

impl Args {
    fn from_tokens(tokens: impl IntoIterator<Item = String>) -> Self {
        let mut args = Args::default();
        for token in tokens {
            match token.split_once('=') {
                Some((key, value)) if is_option_key(key) => {
                    args.options.insert(key.to_string(), value.to_string());
                }
                _ => args.positional.push(token),
            }
        }
        args
    }

    /// Take the next positional word, or fail naming `what` is missing.
    fn next(&mut self, what: &str) -> Result<String, String> {
        if self.positional.is_empty() {
            Err(format!("missing {what}"))
        } else {
            Ok(self.positional.remove(0))
        }
    }

    fn next_parsed<T: FromStr>(&mut self, what: &str) -> Result<T, String>
    where
        T::Err: std::fmt::Display,
    {
        let raw = self.next(what)?;
        raw.parse::<T>().map_err(|e| format!("invalid {what}: {e}"))
    }

    /// The remaining positional words joined by spaces.
    fn rest(&mut self, what: &str) -> Result<String, String> {
        if self.positional.is_empty() {
            return Err(format!("missing {what}"));
        }
        Ok(std::mem::take(&mut self.positional).join(" "))
    }

    fn opt_str(&mut self, key: &str) -> Option<String> {
        self.options.remove(key)
    }

    fn opt<T: FromStr>(&mut self, key: &str) -> Result<Option<T>, String>
    where
        T::Err: std::fmt::Display,
    {
        match self.options.remove(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|e| format!("invalid {key}={raw}: {e}")),
        }
    }

    /// Reject anything the command did not consume.
    fn finish(self) -> Result<(), String> {
        if let Some(key) = self.options.keys().next() {
            return Err(format!("unknown option '{key}'"));
        }
        if !self.positional.is_empty() {
            return Err(format!("unexpected argument '{}'", self.positional.join(" ")));
        }
        Ok(())
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw).map_err(|e| format!("invalid id '{raw}': {e}"))
}

/// `+0.3` / `-0.9` are deltas; `=0.5` sets the value outright.
fn parse_affection(raw: &str) -> Result<AffectionChange, String> {
    let (set, number) = match raw.strip_prefix('=') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let value: f32 = number
        .parse()
        .map_err(|e| format!("invalid affection '{raw}': {e}"))?;
    Ok(if set {
        AffectionChange::Set(value)
    } else {
        AffectionChange::Delta(value)
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Parser
// ─────────────────────────────────────────────────────────────────────────────

/// Parse one REPL line.  `Ok(None)` for a blank line.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let mut tokens = tokenize(line)?.into_iter();
    let Some(head) = tokens.next() else {
        return Ok(None);
    };
    let mut args = Args::from_tokens(tokens);

    let cmd = match head.as_str() {
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        "/stats" => Command::Stats,
        "/store" => Command::Store {
            channel: args.next_parsed("channel")?,
            importance: args.opt("importance")?,
            content: args.rest("content")?,
        },
        "/recall" => Command::Recall {
            channel: args.opt("channel")?,
            limit: args.opt("limit")?,
            threshold: args.opt("threshold")?,
            query: args.rest("query")?,
        },
        "/summarize" => Command::Summarize {
            channel: args.next_parsed("channel")?,
            hours: args.opt("hours")?,
            limit: args.opt("limit")?,
        },
        "/reflect" => Command::Reflect {
            limit: args.opt("limit")?,
            threshold: args.opt("threshold")?,
            query: args.rest("query")?,
        },
        "/context" => Command::Context {
            channel: args.next_parsed("channel")?,
            message: args.rest("message")?,
        },
        "/prune" => Command::Prune {
            days: args.opt("days")?,
            importance: args.opt("importance")?,
        },
        "/relate" => Command::Relate {
            person_id: args.next("person id")?,
            note: args.opt_str("note"),
            affection: args
                .opt_str("affection")
                .map(|raw| parse_affection(&raw))
                .transpose()?,
            relationship_type: args.opt_str("type"),
            moment: args.opt_str("moment"),
        },
        "/people" => Command::People {
            order: match args.positional.is_empty() {
                true => PeopleOrder::default(),
                false => args.next_parsed("order")?,
            },
            limit: args.opt("limit")?,
        },
        "/person" => Command::Person {
            person_id: args.next("person id")?,
        },
        "/think" => Command::Think {
            thought_type: args.next_parsed("thought type")?,
            mood: args.opt("mood")?,
            importance: args.opt("importance")?,
            content: args.rest("content")?,
        },
        "/thoughts" => Command::Thoughts {
            thought_type: match args.positional.is_empty() {
                true => None,
                false => Some(args.next_parsed("thought type")?),
            },
            limit: args.opt("limit")?,
        },
        "/journal" if args.positional.is_empty() => Command::JournalRecent {
            limit: args.opt("limit")?,
        },
        "/journal" => Command::Journal {
            journal_type: args.next_parsed("journal type")?,
            mood: args.opt("mood")?,
            energy: args.opt("energy")?,
            content: args.rest("content")?,
        },
        "/learn" => Command::Learn {
            topic: args.next("topic")?,
            knowledge_type: args.opt("type")?,
            source: args.opt_str("source"),
            confidence: args.opt("confidence")?,
            tags: args
                .opt_str("tags")
                .map(|t| {
                    t.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            content: args.rest("content")?,
        },
        "/knowledge" => Command::Knowledge {
            topic: args.opt_str("topic"),
            limit: args.opt("limit")?,
            threshold: args.opt("threshold")?,
            query: args.rest("query")?,
        },
        "/todo" => parse_todo(&mut args)?,
        "/forget" => Command::Forget {
            kind: args.next_parsed("record kind")?,
            id: parse_uuid(&args.next("id")?)?,
        },
        other => return Err(format!("unknown command '{other}'")),
    };

    args.finish()?;
    Ok(Some(cmd))
}

fn parse_todo(args: &mut Args) -> Result<Command, String> {
    let sub = if args.positional.is_empty() {
        "list".to_string()
    } else {
        args.next("subcommand")?
    };
    match sub.as_str() {
        "add" => Ok(Command::TodoAdd {
            description: args.opt_str("desc"),
            priority: args.opt("priority")?,
            category: args.opt("category")?,
            project: args.opt_str("project"),
            title: args.rest("title")?,
        }),
        "list" | "ls" => Ok(Command::TodoList {
            status: match args.positional.is_empty() {
                true => None,
                false => Some(args.next_parsed("status")?),
            },
            project: args.opt_str("project"),
        }),
        "done" => Ok(Command::TodoDone {
            id: parse_uuid(&args.next("id")?)?,
        }),
        "update" => Ok(Command::TodoUpdate {
            id: parse_uuid(&args.next("id")?)?,
            status: args.opt("status")?,
            priority: args.opt("priority")?,
            category: args.opt("category")?,
            title: args.opt_str("title"),
            project: args.opt_str("project"),
        }),
        "rm" | "delete" => Ok(Command::TodoRemove {
            id: parse_uuid(&args.next("id")?)?,
        }),
        other => Err(format!("unknown todo subcommand '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_honours_quotes() {
        let t = tokenize(r#"/relate bob note="likes rust a lot" type=friend"#).unwrap();
        assert_eq!(t, vec!["/relate", "bob", "note=likes rust a lot", "type=friend"]);
    }

    #[test]
    fn tokenize_rejects_unterminated_quote() {
        assert!(tokenize(r#"/store x "oops"#).is_err());
    }

    #[test]
    fn tokenize_keeps_empty_quoted_value() {
        assert_eq!(tokenize(r#"a """#).unwrap(), vec!["a", ""]);
    }

    #[test]
    fn blank_line_is_none() {
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn store_joins_free_text_and_reads_options() {
        let cmd = parse("/store stream_chat chat picked  the next game importance=0.8").unwrap();
        assert_eq!(
            cmd,
            Some(Command::Store {
                channel: Channel::StreamChat,
                content: "chat picked the next game".into(),
                importance: Some(0.8),
            })
        );
    }

    #[test]
    fn store_with_unknown_channel_fails() {
        let err = parse("/store myspace hello").unwrap_err();
        assert!(err.contains("channel"), "{err}");
    }

    #[test]
    fn recall_options_are_optional() {
        let cmd = parse("/recall what game channel=discord limit=3").unwrap().unwrap();
        assert_eq!(
            cmd,
            Command::Recall {
                query: "what game".into(),
                channel: Some(Channel::Discord),
                limit: Some(3),
                threshold: None,
            }
        );
    }

    #[test]
    fn relate_parses_delta_and_set() {
        match parse("/relate alice affection=-0.9").unwrap().unwrap() {
            Command::Relate { affection, .. } => {
                assert_eq!(affection, Some(AffectionChange::Delta(-0.9)))
            }
            other => panic!("unexpected {other:?}"),
        }
        match parse("/relate alice affection==0.5").unwrap().unwrap() {
            Command::Relate { affection, .. } => {
                assert_eq!(affection, Some(AffectionChange::Set(0.5)))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn people_defaults_to_favorites() {
        assert_eq!(
            parse("/people").unwrap(),
            Some(Command::People {
                order: PeopleOrder::Favorites,
                limit: None
            })
        );
        assert_eq!(
            parse("/people recent limit=3").unwrap(),
            Some(Command::People {
                order: PeopleOrder::Recent,
                limit: Some(3)
            })
        );
    }

    #[test]
    fn journal_without_args_lists_recent() {
        assert_eq!(
            parse("/journal limit=2").unwrap(),
            Some(Command::JournalRecent { limit: Some(2) })
        );
    }

    #[test]
    fn learn_splits_tags() {
        match parse("/learn rust lifetimes tie borrows to scopes tags=rust,,borrowck ")
            .unwrap()
            .unwrap()
        {
            Command::Learn { topic, content, tags, .. } => {
                assert_eq!(topic, "rust");
                assert_eq!(content, "lifetimes tie borrows to scopes");
                assert_eq!(tags, vec!["rust", "borrowck"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn todo_subcommands() {
        let id = Uuid::new_v4();
        assert_eq!(
            parse("/todo").unwrap(),
            Some(Command::TodoList {
                status: None,
                project: None
            })
        );
        assert_eq!(
            parse(&format!("/todo done {id}")).unwrap(),
            Some(Command::TodoDone { id })
        );
        match parse("/todo add fix overlay priority=p0 project=stream").unwrap().unwrap() {
            Command::TodoAdd { title, priority, project, .. } => {
                assert_eq!(title, "fix overlay");
                assert_eq!(priority, Some(Priority::P0));
                assert_eq!(project.as_deref(), Some("stream"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_option_is_rejected() {
        let err = parse("/prune days=3 colour=blue").unwrap_err();
        assert!(err.contains("colour"), "{err}");
    }

    #[test]
    fn forget_requires_valid_uuid() {
        assert!(parse("/forget memory not-a-uuid").is_err());
    }

    #[test]
    fn unknown_command() {
        assert!(parse("/dance").is_err());
    }
}
