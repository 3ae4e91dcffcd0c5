//! Command-line token compiler.
//!
//! Turns the arguments after `dpll OBJECT VERB` into a [`Request`]: the
//! command code plus a TLV attribute buffer ready to be sent. Each
//! object/verb pair has a declarative grammar of keywords and nested groups;
//! the value widths come from the attribute tables, so a keyword can never
//! be encoded with a different width than the decoder expects.
//!
//! Tokens are consumed strictly left to right. A nested group such as
//! `parent-device 7 direction input prio 2` is opened by its keyword, seeded
//! with the identifying value, and then takes group members until the first
//! token that is not one of them. That token is handed back to the outer
//! loop untouched.

use std::fmt;

use super::table::{AttrDesc, AttrKind, AttrTable, DEVICE, PIN};
use super::types::{self, Vocab};
use super::{DpllAttr as D, DpllCmd, DpllPinAttr as P};
use crate::netlink::builder::{AttrBuilder, MAX_ATTR_PAYLOAD};
use crate::util::parse;

/// Object a command operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Object {
    Device,
    Pin,
}

impl Object {
    pub fn name(self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Pin => "pin",
        }
    }

    /// Attribute table of replies for this object.
    pub fn table(self) -> &'static AttrTable {
        match self {
            Self::Device => &DEVICE,
            Self::Pin => &PIN,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operation requested on an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Show,
    Set,
    IdGet,
}

impl Verb {
    /// Parse a verb token.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "show" => Some(Self::Show),
            "set" => Some(Self::Set),
            "id-get" => Some(Self::IdGet),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Set => "set",
            Self::IdGet => "id-get",
        }
    }
}

/// Errors produced while compiling command-line tokens.
///
/// `position` is the index of the offending token in the compiled slice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("unknown option: {token}")]
    UnknownKeyword { token: String, position: usize },

    #[error("{keyword} requires an argument")]
    MissingValue {
        keyword: &'static str,
        position: usize,
    },

    #[error("invalid {keyword}: {value}")]
    InvalidNumber {
        keyword: &'static str,
        value: String,
        position: usize,
    },

    #[error("invalid {keyword}: {value} (use {expected})")]
    InvalidEnum {
        keyword: &'static str,
        value: String,
        expected: String,
        position: usize,
    },

    #[error("{keyword} value is too long")]
    TooLong {
        keyword: &'static str,
        position: usize,
    },

    #[error("{keyword} specified more than once")]
    Duplicate {
        keyword: &'static str,
        position: usize,
    },

    #[error("{object} id is required")]
    MissingRequired { object: &'static str },
}

impl CompileError {
    /// Index of the offending token, if the error is tied to one.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::UnknownKeyword { position, .. }
            | Self::MissingValue { position, .. }
            | Self::InvalidNumber { position, .. }
            | Self::InvalidEnum { position, .. }
            | Self::TooLong { position, .. }
            | Self::Duplicate { position, .. } => Some(*position),
            Self::MissingRequired { .. } => None,
        }
    }
}

/// A compiled request, ready to be framed and sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub object: Object,
    pub verb: Verb,
    pub cmd: DpllCmd,
    /// Request is a dump (`show` without an id).
    pub dump: bool,
    /// Object id named by the `id` keyword.
    pub target: Option<u32>,
    /// TLV attribute buffer.
    pub attrs: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
enum Syntax {
    /// Number or string, according to the attribute's wire kind.
    Plain,
    Vocab(&'static Vocab),
    /// `true | false | 1 | 0`.
    Switch,
}

#[derive(Debug)]
struct Keyword {
    word: &'static str,
    attr: u16,
    syntax: Syntax,
    /// Only meaningful for dumps; dropped when an id is given.
    filter: bool,
}

const fn plain(word: &'static str, attr: u16) -> Keyword {
    Keyword {
        word,
        attr,
        syntax: Syntax::Plain,
        filter: false,
    }
}

const fn vocab(word: &'static str, attr: u16, vocab: &'static Vocab) -> Keyword {
    Keyword {
        word,
        attr,
        syntax: Syntax::Vocab(vocab),
        filter: false,
    }
}

const fn switch(word: &'static str, attr: u16) -> Keyword {
    Keyword {
        word,
        attr,
        syntax: Syntax::Switch,
        filter: false,
    }
}

const fn filter(word: &'static str, attr: u16) -> Keyword {
    Keyword {
        word,
        attr,
        syntax: Syntax::Plain,
        filter: true,
    }
}

#[derive(Debug)]
struct Group {
    word: &'static str,
    /// Nest attribute type in the outer table.
    attr: u16,
    /// Attribute carrying the value that follows the group keyword.
    seed: u16,
    members: &'static [Keyword],
    repeat: bool,
}

#[derive(Debug)]
struct Grammar {
    object: Object,
    cmd: DpllCmd,
    keywords: &'static [Keyword],
    groups: &'static [Group],
    requires_id: bool,
}

impl Grammar {
    fn keyword(&self, word: &str) -> Option<&'static Keyword> {
        self.keywords.iter().find(|k| k.word == word)
    }

    fn group(&self, word: &str) -> Option<&'static Group> {
        self.groups.iter().find(|g| g.word == word)
    }
}

static DEVICE_SHOW: Grammar = Grammar {
    object: Object::Device,
    cmd: DpllCmd::DeviceGet,
    keywords: &[plain("id", D::Id as u16)],
    groups: &[],
    requires_id: false,
};

static DEVICE_SET: Grammar = Grammar {
    object: Object::Device,
    cmd: DpllCmd::DeviceSet,
    keywords: &[
        plain("id", D::Id as u16),
        switch("phase-offset-monitor", D::PhaseOffsetMonitor as u16),
        plain("phase-offset-avg-factor", D::PhaseOffsetAvgFactor as u16),
    ],
    groups: &[],
    requires_id: true,
};

static DEVICE_ID_GET: Grammar = Grammar {
    object: Object::Device,
    cmd: DpllCmd::DeviceIdGet,
    keywords: &[
        plain("module-name", D::ModuleName as u16),
        plain("clock-id", D::ClockId as u16),
        vocab("type", D::Type as u16, &types::DEVICE_TYPE),
    ],
    groups: &[],
    requires_id: false,
};

static PIN_SHOW: Grammar = Grammar {
    object: Object::Pin,
    cmd: DpllCmd::PinGet,
    keywords: &[
        plain("id", P::Id as u16),
        // The dump filter reuses the device id attribute type
        filter("device", D::Id as u16),
    ],
    groups: &[],
    requires_id: false,
};

static PIN_SET: Grammar = Grammar {
    object: Object::Pin,
    cmd: DpllCmd::PinSet,
    keywords: &[
        plain("id", P::Id as u16),
        plain("frequency", P::Frequency as u16),
        vocab("direction", P::Direction as u16, &types::PIN_DIRECTION),
        plain("prio", P::Prio as u16),
        vocab("state", P::State as u16, &types::PIN_STATE),
        plain("phase-adjust", P::PhaseAdjust as u16),
        plain("esync-frequency", P::EsyncFrequency as u16),
    ],
    groups: &[
        Group {
            word: "parent-device",
            attr: P::ParentDevice as u16,
            seed: P::ParentId as u16,
            members: &[
                vocab("direction", P::Direction as u16, &types::PIN_DIRECTION),
                plain("prio", P::Prio as u16),
                vocab("state", P::State as u16, &types::PIN_STATE),
            ],
            repeat: false,
        },
        Group {
            word: "parent-pin",
            attr: P::ParentPin as u16,
            seed: P::ParentId as u16,
            members: &[vocab("state", P::State as u16, &types::PIN_STATE)],
            repeat: false,
        },
        Group {
            word: "reference-sync",
            attr: P::ReferenceSync as u16,
            seed: P::Id as u16,
            members: &[vocab("state", P::State as u16, &types::PIN_STATE)],
            repeat: true,
        },
    ],
    requires_id: true,
};

static PIN_ID_GET: Grammar = Grammar {
    object: Object::Pin,
    cmd: DpllCmd::PinIdGet,
    keywords: &[
        plain("module-name", P::ModuleName as u16),
        plain("clock-id", P::ClockId as u16),
        plain("board-label", P::BoardLabel as u16),
        plain("panel-label", P::PanelLabel as u16),
        plain("package-label", P::PackageLabel as u16),
        vocab("type", P::Type as u16, &types::PIN_TYPE),
    ],
    groups: &[],
    requires_id: false,
};

fn grammar(object: Object, verb: Verb) -> &'static Grammar {
    match (object, verb) {
        (Object::Device, Verb::Show) => &DEVICE_SHOW,
        (Object::Device, Verb::Set) => &DEVICE_SET,
        (Object::Device, Verb::IdGet) => &DEVICE_ID_GET,
        (Object::Pin, Verb::Show) => &PIN_SHOW,
        (Object::Pin, Verb::Set) => &PIN_SET,
        (Object::Pin, Verb::IdGet) => &PIN_ID_GET,
    }
}

/// A parsed value, already range-checked for its attribute's width.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Arg {
    Unsigned(u64),
    Signed(i64),
    Text(String),
}

#[derive(Debug)]
struct Field {
    keyword: &'static str,
    /// Position of the value token.
    position: usize,
    desc: &'static AttrDesc,
    arg: Arg,
    filter: bool,
}

#[derive(Debug)]
enum Item {
    Field(Field),
    Group {
        keyword: &'static str,
        position: usize,
        attr: u16,
        fields: Vec<Field>,
    },
}

/// Token cursor over the argument slice.
struct Tokens<'t, S> {
    tokens: &'t [S],
    pos: usize,
}

impl<'t, S: AsRef<str>> Tokens<'t, S> {
    fn peek(&self) -> Option<&'t str> {
        self.tokens.get(self.pos).map(AsRef::as_ref)
    }

    fn next(&mut self) -> Option<(usize, &'t str)> {
        let token = self.peek()?;
        let pos = self.pos;
        self.pos += 1;
        Some((pos, token))
    }

    /// Take the value following `keyword`.
    fn value(&mut self, keyword: &'static str) -> Result<(usize, &'t str), CompileError> {
        let position = self.pos;
        self.next().ok_or(CompileError::MissingValue { keyword, position })
    }
}

fn lookup(
    table: &'static AttrTable,
    attr: u16,
    word: &str,
    position: usize,
) -> Result<&'static AttrDesc, CompileError> {
    table
        .attrs
        .iter()
        .find(|d| d.id == attr)
        .ok_or_else(|| CompileError::UnknownKeyword {
            token: word.to_string(),
            position,
        })
}

fn invalid_number(keyword: &'static str, value: &str, position: usize) -> CompileError {
    CompileError::InvalidNumber {
        keyword,
        value: value.to_string(),
        position,
    }
}

/// Parse `value` for `keyword` according to the syntax and the wire kind.
fn parse_arg(
    keyword: &'static str,
    syntax: Syntax,
    desc: &AttrDesc,
    value: &str,
    position: usize,
) -> Result<Arg, CompileError> {
    match syntax {
        Syntax::Vocab(vocab) => {
            vocab
                .value(value)
                .map(|v| Arg::Unsigned(u64::from(v)))
                .ok_or_else(|| CompileError::InvalidEnum {
                    keyword,
                    value: value.to_string(),
                    expected: vocab.expected(),
                    position,
                })
        }
        Syntax::Switch => match value {
            "true" | "1" => Ok(Arg::Unsigned(1)),
            "false" | "0" => Ok(Arg::Unsigned(0)),
            _ => Err(CompileError::InvalidEnum {
                keyword,
                value: value.to_string(),
                expected: "true/false".to_string(),
                position,
            }),
        },
        Syntax::Plain => {
            let bad = |_| invalid_number(keyword, value, position);
            match desc.kind {
                AttrKind::U8 => parse::get_u8(value).map(|v| Arg::Unsigned(v.into())).map_err(bad),
                AttrKind::U32 => parse::get_u32(value)
                    .map(|v| Arg::Unsigned(v.into()))
                    .map_err(bad),
                AttrKind::U64 => parse::get_u64(value).map(Arg::Unsigned).map_err(bad),
                AttrKind::S32 => parse::get_i32(value)
                    .map(|v| Arg::Signed(v.into()))
                    .map_err(bad),
                AttrKind::S64 | AttrKind::Sint => {
                    parse::get_i64(value).map(Arg::Signed).map_err(bad)
                }
                // Room for the NUL terminator
                AttrKind::Text if value.len() >= MAX_ATTR_PAYLOAD => {
                    Err(CompileError::TooLong { keyword, position })
                }
                AttrKind::Text => Ok(Arg::Text(value.to_string())),
                AttrKind::Nested(_) => Err(CompileError::UnknownKeyword {
                    token: keyword.to_string(),
                    position,
                }),
            }
        }
    }
}

/// Parse one `keyword VALUE` pair whose keyword token was already consumed.
fn parse_field<S: AsRef<str>>(
    tokens: &mut Tokens<'_, S>,
    table: &'static AttrTable,
    keyword: &'static Keyword,
    position: usize,
) -> Result<Field, CompileError> {
    let desc = lookup(table, keyword.attr, keyword.word, position)?;
    let (vpos, value) = tokens.value(keyword.word)?;
    let arg = parse_arg(keyword.word, keyword.syntax, desc, value, vpos)?;
    Ok(Field {
        keyword: keyword.word,
        position: vpos,
        desc,
        arg,
        filter: keyword.filter,
    })
}

/// Parse a nested group whose keyword token was already consumed.
fn parse_group<S: AsRef<str>>(
    tokens: &mut Tokens<'_, S>,
    table: &'static AttrTable,
    group: &'static Group,
    position: usize,
) -> Result<Item, CompileError> {
    let outer = lookup(table, group.attr, group.word, position)?;
    let AttrKind::Nested(inner) = outer.kind else {
        return Err(CompileError::UnknownKeyword {
            token: group.word.to_string(),
            position,
        });
    };

    let seed = lookup(inner, group.seed, group.word, position)?;
    let (vpos, value) = tokens.value(group.word)?;
    let mut fields = vec![Field {
        keyword: group.word,
        position: vpos,
        desc: seed,
        arg: parse_arg(group.word, Syntax::Plain, seed, value, vpos)?,
        filter: false,
    }];

    let mut seen: Vec<&str> = Vec::new();
    while let Some(word) = tokens.peek() {
        let Some(member) = group.members.iter().find(|m| m.word == word) else {
            break;
        };
        let mpos = tokens.pos;
        tokens.pos += 1;
        if seen.contains(&member.word) {
            return Err(CompileError::Duplicate {
                keyword: member.word,
                position: mpos,
            });
        }
        seen.push(member.word);
        fields.push(parse_field(tokens, inner, member, mpos)?);
    }

    Ok(Item::Group {
        keyword: group.word,
        position,
        attr: group.attr,
        fields,
    })
}

fn put(builder: &mut AttrBuilder, field: &Field) -> Result<(), CompileError> {
    let id = field.desc.id;
    match (&field.arg, field.desc.kind) {
        (Arg::Unsigned(v), AttrKind::U8) => builder.append_attr_u8(id, *v as u8),
        (Arg::Unsigned(v), AttrKind::U64) => builder.append_attr_u64(id, *v),
        (Arg::Unsigned(v), _) => builder.append_attr_u32(id, *v as u32),
        (Arg::Signed(v), AttrKind::S32) => builder.append_attr_s32(id, *v as i32),
        (Arg::Signed(v), _) => builder.append_attr_s64(id, *v),
        (Arg::Text(s), _) => {
            builder
                .append_attr_str(id, s)
                .map_err(|_| CompileError::TooLong {
                    keyword: field.keyword,
                    position: field.position,
                })?
        }
    }
    Ok(())
}

/// Compile the tokens following `OBJECT VERB` into a request.
///
/// # Errors
///
/// Returns the first problem found, scanning left to right. A missing `id`
/// for `set` is reported only after every other token parsed.
pub fn compile<S: AsRef<str>>(
    object: Object,
    verb: Verb,
    tokens: &[S],
) -> Result<Request, CompileError> {
    let grammar = grammar(object, verb);
    let table = object.table();
    let mut tokens = Tokens { tokens, pos: 0 };
    let mut items = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    let mut target = None;

    while let Some((position, word)) = tokens.next() {
        if let Some(keyword) = grammar.keyword(word) {
            if seen.contains(&keyword.word) {
                return Err(CompileError::Duplicate {
                    keyword: keyword.word,
                    position,
                });
            }
            seen.push(keyword.word);
            let field = parse_field(&mut tokens, table, keyword, position)?;
            if keyword.word == "id"
                && let Arg::Unsigned(v) = field.arg
            {
                target = u32::try_from(v).ok();
            }
            items.push(Item::Field(field));
        } else if let Some(group) = grammar.group(word) {
            if !group.repeat && seen.contains(&group.word) {
                return Err(CompileError::Duplicate {
                    keyword: group.word,
                    position,
                });
            }
            seen.push(group.word);
            items.push(parse_group(&mut tokens, table, group, position)?);
        } else {
            return Err(CompileError::UnknownKeyword {
                token: word.to_string(),
                position,
            });
        }
    }

    if grammar.requires_id && target.is_none() {
        return Err(CompileError::MissingRequired {
            object: grammar.object.name(),
        });
    }

    let dump = verb == Verb::Show && target.is_none();
    let mut builder = AttrBuilder::new();
    for item in &items {
        match item {
            Item::Field(field) => {
                if field.filter && !dump {
                    continue;
                }
                put(&mut builder, field)?;
            }
            Item::Group {
                keyword,
                position,
                attr,
                fields,
            } => {
                let nest = builder.nest_start(*attr);
                for field in fields {
                    put(&mut builder, field)?;
                }
                builder
                    .nest_end(nest)
                    .map_err(|_| CompileError::TooLong {
                        keyword: *keyword,
                        position: *position,
                    })?;
            }
        }
    }

    Ok(Request {
        object,
        verb,
        cmd: grammar.cmd,
        dump,
        target,
        attrs: builder.finish(),
    })
}
