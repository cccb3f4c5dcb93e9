//! Closed vocabulary of canonical node kinds
//!
//! Every element of a normalized article carries one of these kinds. The
//! names are the ones used in dictionary TSV files and portal JSON configs.
//! Two members, [`Kind::ToUnwrap`] and [`Kind::ToDecompose`], are transient
//! markers consumed by the rewrite passes and never reach the output.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Kind {
    // Paragraph-like
    Paragraph,
    Heading,
    Source,
    Question,
    FeedMeta,
    FeedTime,
    FeedAuthor,
    CommentMeta,
    CommentTime,
    CommentAuthor,

    // Blocks and their members
    Box,
    Lead,
    List,
    ListItem,
    Quote,
    InlineQuote,
    Table,
    Row,
    Column,
    RowValid,
    ColumnValid,
    ColumnRow,
    TableHeading,
    Feed,
    Gallery,
    Quiz,
    AnswerBlock,
    Answer,
    Comment,
    CommentRoot,
    Forum,

    // Media
    MediaContent,
    EmbeddedContent,
    Figure,
    SocialMedia,
    SocialHeader,
    MediaReference,
    Reference,

    // Inline formatting
    Bold,
    Italic,
    Emphasized,
    Underline,
    Strikeout,
    Superscript,
    Subscript,
    Hi,
    Ref,

    // Structural helpers
    Section,
    Note,
    ToUnwrap,
    ToDecompose,
}

impl Kind {
    pub const ALL: [Kind; 51] = [
        Kind::Paragraph,
        Kind::Heading,
        Kind::Source,
        Kind::Question,
        Kind::FeedMeta,
        Kind::FeedTime,
        Kind::FeedAuthor,
        Kind::CommentMeta,
        Kind::CommentTime,
        Kind::CommentAuthor,
        Kind::Box,
        Kind::Lead,
        Kind::List,
        Kind::ListItem,
        Kind::Quote,
        Kind::InlineQuote,
        Kind::Table,
        Kind::Row,
        Kind::Column,
        Kind::RowValid,
        Kind::ColumnValid,
        Kind::ColumnRow,
        Kind::TableHeading,
        Kind::Feed,
        Kind::Gallery,
        Kind::Quiz,
        Kind::AnswerBlock,
        Kind::Answer,
        Kind::Comment,
        Kind::CommentRoot,
        Kind::Forum,
        Kind::MediaContent,
        Kind::EmbeddedContent,
        Kind::Figure,
        Kind::SocialMedia,
        Kind::SocialHeader,
        Kind::MediaReference,
        Kind::Reference,
        Kind::Bold,
        Kind::Italic,
        Kind::Emphasized,
        Kind::Underline,
        Kind::Strikeout,
        Kind::Superscript,
        Kind::Subscript,
        Kind::Hi,
        Kind::Ref,
        Kind::Section,
        Kind::Note,
        Kind::ToUnwrap,
        Kind::ToDecompose,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Kind::Paragraph => "paragraph",
            Kind::Heading => "heading",
            Kind::Source => "source",
            Kind::Question => "question",
            Kind::FeedMeta => "feed_meta",
            Kind::FeedTime => "feed_time",
            Kind::FeedAuthor => "feed_author",
            Kind::CommentMeta => "comment_meta",
            Kind::CommentTime => "comment_time",
            Kind::CommentAuthor => "comment_author",
            Kind::Box => "box",
            Kind::Lead => "lead",
            Kind::List => "list",
            Kind::ListItem => "list_item",
            Kind::Quote => "quote",
            Kind::InlineQuote => "inline_quote",
            Kind::Table => "table",
            Kind::Row => "row",
            Kind::Column => "column",
            Kind::RowValid => "row_valid",
            Kind::ColumnValid => "column_valid",
            Kind::ColumnRow => "column_row",
            Kind::TableHeading => "table_heading",
            Kind::Feed => "feed",
            Kind::Gallery => "gallery",
            Kind::Quiz => "quiz",
            Kind::AnswerBlock => "answer_block",
            Kind::Answer => "answer",
            Kind::Comment => "comment",
            Kind::CommentRoot => "comment_root",
            Kind::Forum => "forum",
            Kind::MediaContent => "media_content",
            Kind::EmbeddedContent => "embedded_content",
            Kind::Figure => "figure",
            Kind::SocialMedia => "social_media",
            Kind::SocialHeader => "social_header",
            Kind::MediaReference => "media_reference",
            Kind::Reference => "reference",
            Kind::Bold => "bold",
            Kind::Italic => "italic",
            Kind::Emphasized => "emphasized",
            Kind::Underline => "underline",
            Kind::Strikeout => "strikeout",
            Kind::Superscript => "superscript",
            Kind::Subscript => "subscript",
            Kind::Hi => "hi",
            Kind::Ref => "ref",
            Kind::Section => "section",
            Kind::Note => "note",
            Kind::ToUnwrap => "to_unwrap",
            Kind::ToDecompose => "to_decompose",
        }
    }

    #[must_use]
    pub const fn is_block(self) -> bool {
        BLOCKS.contains(self)
    }

    #[must_use]
    pub const fn is_inline(self) -> bool {
        INLINE.contains(self)
    }

    /// Kinds that survive the cleaning pass. Anything else is unwrapped.
    #[must_use]
    pub const fn is_builtin(self) -> bool {
        BUILTIN.contains(self)
    }

    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Kind::ToUnwrap | Kind::ToDecompose)
    }

    /// Child kinds a media root keeps when it is curated.
    #[must_use]
    pub const fn media_children(self) -> KindSet {
        match self {
            Kind::MediaContent => KindSet::of(&[
                Kind::MediaReference,
                Kind::Source,
                Kind::Paragraph,
                Kind::Reference,
            ]),
            Kind::SocialMedia => {
                KindSet::of(&[Kind::SocialHeader, Kind::Paragraph, Kind::Reference])
            }
            Kind::Figure => KindSet::of(&[Kind::MediaReference]),
            Kind::EmbeddedContent => KindSet::of(&[
                Kind::Paragraph,
                Kind::Reference,
                Kind::MediaReference,
                Kind::MediaContent,
            ]),
            _ => KindSet::EMPTY,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown kind '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for Kind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// Bit set over [`Kind`]
///
/// Shape queries ("which kinds are among the children") run on every node in
/// several passes, so the sets are plain `u64` masks.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KindSet(u64);

impl KindSet {
    pub const EMPTY: KindSet = KindSet(0);

    #[must_use]
    pub const fn of(kinds: &[Kind]) -> Self {
        let mut bits = 0u64;
        let mut i = 0;
        while i < kinds.len() {
            bits |= 1u64 << (kinds[i] as u8);
            i += 1;
        }
        KindSet(bits)
    }

    #[must_use]
    pub const fn contains(self, kind: Kind) -> bool {
        self.0 & (1u64 << (kind as u8)) != 0
    }

    pub fn insert(&mut self, kind: Kind) {
        self.0 |= 1u64 << (kind as u8);
    }

    #[must_use]
    pub const fn union(self, other: KindSet) -> KindSet {
        KindSet(self.0 | other.0)
    }

    #[must_use]
    pub const fn intersection(self, other: KindSet) -> KindSet {
        KindSet(self.0 & other.0)
    }

    #[must_use]
    pub const fn difference(self, other: KindSet) -> KindSet {
        KindSet(self.0 & !other.0)
    }

    #[must_use]
    pub const fn is_subset(self, other: KindSet) -> bool {
        self.0 & !other.0 == 0
    }

    #[must_use]
    pub const fn intersects(self, other: KindSet) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// The only member, if the set has exactly one.
    #[must_use]
    pub fn single(self) -> Option<Kind> {
        if self.len() == 1 { self.iter().next() } else { None }
    }

    pub fn iter(self) -> impl Iterator<Item = Kind> {
        Kind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl fmt::Debug for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Kind> for KindSet {
    fn from_iter<I: IntoIterator<Item = Kind>>(iter: I) -> Self {
        let mut set = KindSet::EMPTY;
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

pub const INLINE: KindSet = KindSet::of(&[
    Kind::Bold,
    Kind::Italic,
    Kind::Emphasized,
    Kind::Reference,
    Kind::Underline,
    Kind::Strikeout,
    Kind::Superscript,
    Kind::Subscript,
    Kind::InlineQuote,
    Kind::Hi,
    Kind::Ref,
]);

/// Inline kinds that carry visual emphasis (everything inline except links)
pub const HIGHLIGHT: KindSet = INLINE.difference(KindSet::of(&[Kind::Reference, Kind::MediaReference]));

pub const PARAGRAPH_LIKE: KindSet = KindSet::of(&[
    Kind::Paragraph,
    Kind::Heading,
    Kind::Source,
    Kind::Question,
    Kind::FeedMeta,
    Kind::FeedTime,
    Kind::FeedAuthor,
    Kind::CommentMeta,
    Kind::CommentTime,
    Kind::CommentAuthor,
]);

pub const PARAGRAPH_AND_INLINE: KindSet = INLINE.union(KindSet::of(&[Kind::Paragraph]));

pub const BLOCKS: KindSet = KindSet::of(&[
    Kind::Box,
    Kind::Lead,
    Kind::List,
    Kind::Quote,
    Kind::Table,
    Kind::Feed,
    Kind::Gallery,
    Kind::Quiz,
    Kind::Comment,
]);

/// Link-carrying kinds that may be textless during normalization
pub const LINK_KINDS: KindSet = KindSet::of(&[Kind::MediaReference, Kind::Reference]);

/// Kinds that are meaningful without any text of their own
pub const TEXTLESS_ALLOWED: KindSet = KindSet::of(&[
    Kind::Gallery,
    Kind::MediaContent,
    Kind::EmbeddedContent,
    Kind::Figure,
    Kind::SocialMedia,
]);

pub const MEDIA_ROOTS: KindSet = KindSet::of(&[
    Kind::MediaContent,
    Kind::SocialMedia,
    Kind::Figure,
    Kind::EmbeddedContent,
]);

/// Media kinds rendered as a figure element
pub const FIGURES: KindSet =
    KindSet::of(&[Kind::MediaContent, Kind::Figure, Kind::EmbeddedContent]);

pub const TABLE_CELLS: KindSet = KindSet::of(&[Kind::Column, Kind::TableHeading]);

pub const TABLE_MEMBERS: KindSet =
    KindSet::of(&[Kind::RowValid, Kind::ColumnRow, Kind::ColumnValid]);

pub const BUILTIN: KindSet = KindSet::of(&[
    Kind::ToDecompose,
    Kind::ToUnwrap,
    Kind::Paragraph,
    Kind::Box,
    Kind::Lead,
    Kind::Heading,
    Kind::List,
    Kind::ListItem,
    Kind::Quote,
    Kind::Source,
    Kind::Bold,
    Kind::Italic,
    Kind::Emphasized,
    Kind::Underline,
    Kind::Strikeout,
    Kind::Superscript,
    Kind::Subscript,
    Kind::Table,
    Kind::SocialMedia,
    Kind::InlineQuote,
    Kind::Reference,
    Kind::ColumnValid,
    Kind::RowValid,
    Kind::ColumnRow,
    Kind::TableHeading,
    Kind::Feed,
    Kind::FeedMeta,
    Kind::FeedTime,
    Kind::FeedAuthor,
    Kind::Comment,
    Kind::CommentMeta,
    Kind::CommentTime,
    Kind::CommentAuthor,
    Kind::CommentRoot,
    Kind::Gallery,
    Kind::Quiz,
    Kind::Question,
    Kind::AnswerBlock,
    Kind::Answer,
    Kind::Forum,
    Kind::MediaContent,
    Kind::EmbeddedContent,
    Kind::Figure,
    Kind::Hi,
    Kind::Ref,
]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_from_str() {
        for kind in Kind::ALL {
            assert_eq!(kind.as_str().parse::<Kind>().ok(), Some(kind));
        }
        assert!("div".parse::<Kind>().is_err());
    }

    #[test]
    fn test_all_kinds_fit_in_mask() {
        assert!(Kind::ALL.len() <= 64);
        let all: KindSet = Kind::ALL.into_iter().collect();
        assert_eq!(all.len(), Kind::ALL.len());
    }

    #[test]
    fn test_highlight_excludes_links() {
        assert!(INLINE.contains(Kind::Reference));
        assert!(!HIGHLIGHT.contains(Kind::Reference));
        assert!(HIGHLIGHT.contains(Kind::Bold));
    }

    #[test]
    fn test_set_algebra() {
        let a = KindSet::of(&[Kind::Bold, Kind::Italic]);
        assert!(a.is_subset(INLINE));
        assert!(!a.union(KindSet::of(&[Kind::Box])).is_subset(INLINE));
        assert_eq!(KindSet::of(&[Kind::Box]).single(), Some(Kind::Box));
        assert_eq!(a.single(), None);
        assert!(KindSet::EMPTY.is_subset(INLINE));
    }

    #[test]
    fn test_scaffolding_kinds_are_not_builtin() {
        for kind in [Kind::Row, Kind::Column, Kind::MediaReference, Kind::Section, Kind::Note] {
            assert!(!kind.is_builtin(), "{kind} should be unwrapped by cleaning");
        }
    }

    #[test]
    fn test_unknown_kind_is_an_error_value() {
        let err = "blink".parse::<Kind>().expect_err("not a kind");
        assert_eq!(err, UnknownKind("blink".into()));
        assert_eq!(err.to_string(), "unknown kind 'blink'");
        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(err);
        assert!(boxed.source().is_none());
    }
}
