//! Token types for the Logos-based lexer.

use logos::Logos;

/// Token types recognized by the lexer.
///
/// Patterns that can match the same text carry distinct priorities; when
/// lengths differ Logos takes the longest match, so `OPEN` stays a word while
/// `OP2` is an opening marker.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\u{3000}]+")]
pub enum Token<'src> {
    /// Season and episode identifier (e.g., S01E05, S2E12v2, S01EP03)
    #[regex(r"(?i)S[0-9]{1,2}EP?[0-9]{1,4}(v[0-9])?", priority = 30)]
    SeasonEpisode(&'src str),

    /// Season-only identifier (e.g., S01, S2)
    #[regex(r"(?i)S[0-9]{1,2}", priority = 29)]
    Season(&'src str),

    /// CJK season marker (e.g., 第2季, 第3期)
    #[regex(r"第[0-9]{1,2}[季期]", priority = 28)]
    CjkSeason(&'src str),

    /// CJK episode marker (e.g., 第03話, 第12集, 第6.5话)
    #[regex(r"第[0-9]{1,4}(\.5)?[話话集]", priority = 27)]
    CjkEpisode(&'src str),

    /// Prefixed episode number (e.g., E03, EP03, Ep.12, E07v2)
    #[regex(r"(?i)EP?\.?[0-9]{1,4}(v[0-9])?", priority = 26)]
    EpisodeNumber(&'src str),

    /// Hash-prefixed episode number (e.g., #03, #12.5)
    #[regex(r"#[0-9]{1,4}(\.5)?", priority = 25)]
    HashNumber(&'src str),

    /// Volume identifier (e.g., Vol.03, Vol3, Volume02)
    #[regex(r"(?i)Vol(ume)?\.?[0-9]{1,3}", priority = 24)]
    Volume(&'src str),

    /// Spelled-out "Season" keyword
    #[regex(r"(?i)(Season|Saison)", priority = 23)]
    SeasonWord(&'src str),

    /// Spelled-out "Episode" keyword
    #[regex(r"(?i)Episode", priority = 22)]
    EpisodeWord(&'src str),

    /// Opening or ending sequence, optionally creditless and numbered (e.g., NCOP, ED2)
    #[regex(r"(?i)(NC)?(OP|ED)[0-9]{0,2}(v[0-9])?", priority = 21)]
    OpeningEnding(&'src str),

    /// Other anime type keywords (e.g., SP02, OVA, OAD, PV, CM, Menu)
    #[regex(
        r"(?i)(SPs?|Specials?|OVA|OAV|OAD|ONA|PV|CM|Preview|Trailer|Menu|Uncredited)[0-9]{0,3}",
        priority = 20
    )]
    TypeKeyword(&'src str),

    /// Video resolution (e.g., 1080p, 720p, 1920x1080, 4K)
    #[regex(r"(?i)([0-9]{3,4}[pi]|[0-9]{3,4}x[0-9]{3,4}|4K)", priority = 19)]
    Resolution(&'src str),

    /// Video codecs
    #[regex(r"(?i)([xh]\.?26[45]|HEVC|AVC|AV1|XviD|DivX)", priority = 18)]
    VideoCodec(&'src str),

    /// Audio codecs
    #[regex(r"(?i)(AAC|FLAC|AC3|E-?AC-?3|DTS|TrueHD|Opus|MP3)", priority = 17)]
    AudioCodec(&'src str),

    /// Source markers (e.g., BDRip, WEB-DL, HDTV)
    #[regex(
        r"(?i)(BDRip|BluRay|Blu-Ray|BD|BDMV|WEB-?DL|WEB-?Rip|WEB|HDTV|TVRip|DVD|DVDRip)",
        priority = 16
    )]
    Source(&'src str),

    /// Color depth (e.g., Hi10p, 10bit, 8-bit)
    #[regex(r"(?i)(Hi10p?|10-?bit|8-?bit)", priority = 15)]
    BitDepth(&'src str),

    /// Eight-digit hexadecimal checksum, usually bracketed
    #[regex(r"[0-9A-Fa-f]{8}", priority = 14)]
    Checksum(&'src str),

    /// Release version suffix (e.g., v2)
    #[regex(r"(?i)v[0-9]{1,2}", priority = 13)]
    Version(&'src str),

    /// Year (1900-2099)
    #[regex(r"(19|20)[0-9]{2}", priority = 12)]
    Year(&'src str),

    /// Half-step episode number (e.g., 12.5)
    #[regex(r"[0-9]{1,4}\.5", priority = 11)]
    Decimal(&'src str),

    /// Dot delimiter
    #[token(".")]
    Dot,

    /// Hyphen delimiter
    #[token("-")]
    Hyphen,

    /// Underscore delimiter
    #[token("_")]
    Underscore,

    /// Opening square bracket, ASCII or full width
    #[token("[")]
    #[token("【")]
    BracketOpen,

    /// Closing square bracket, ASCII or full width
    #[token("]")]
    #[token("】")]
    BracketClose,

    /// Opening parenthesis, ASCII or full width
    #[token("(")]
    #[token("（")]
    ParenOpen,

    /// Closing parenthesis, ASCII or full width
    #[token(")")]
    #[token("）")]
    ParenClose,

    /// Generic word token (lower priority than specific patterns)
    #[regex(r"[a-zA-Z][a-zA-Z0-9']*", priority = 1)]
    Word(&'src str),

    /// Run of non-ASCII text (CJK titles and the like)
    #[regex(r"[^\x00-\x7F第【】（）\u{3000}]+", priority = 1)]
    #[token("第")]
    Text(&'src str),

    /// Numeric token
    #[regex(r"[0-9]+", priority = 2)]
    Number(&'src str),
}

impl Token<'_> {
    /// Delimiters separate words but carry no content.
    pub fn is_delimiter(&self) -> bool {
        matches!(self, Token::Dot | Token::Hyphen | Token::Underscore)
    }

    /// Season, episode, volume and type markers. A title never extends
    /// past one of these.
    pub fn is_marker(&self) -> bool {
        matches!(
            self,
            Token::SeasonEpisode(_)
                | Token::Season(_)
                | Token::CjkSeason(_)
                | Token::CjkEpisode(_)
                | Token::EpisodeNumber(_)
                | Token::HashNumber(_)
                | Token::Volume(_)
                | Token::SeasonWord(_)
                | Token::EpisodeWord(_)
                | Token::OpeningEnding(_)
                | Token::TypeKeyword(_)
        ) || self.is_noise()
    }

    /// Plain numbers, including half steps.
    pub fn as_number(&self) -> Option<&str> {
        match self {
            Token::Number(n) | Token::Decimal(n) => Some(n),
            _ => None,
        }
    }

    /// Encoding and checksum details that never belong to a title.
    pub fn is_noise(&self) -> bool {
        matches!(
            self,
            Token::Resolution(_)
                | Token::VideoCodec(_)
                | Token::AudioCodec(_)
                | Token::Source(_)
                | Token::BitDepth(_)
                | Token::Checksum(_)
        )
    }
}
