use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// Every label the event file and the player store know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Label {
    // event
    Week,
    Season,
    SeasonRace,
    EventStatus,
    Car,
    Track,
    Desc,
    Out,
    StatFile,
    Shape,
    GoldShift,
    Squeeze,
    Scoot,
    Weight,
    Comment,
    Image,
    Report,
    DbFix,
    // submission
    User,
    Name,
    Psn,
    Country,
    Time,
    Total,
    Split,
    Sector,
    Status,
    Disq,
    // player store
    PlayerId,
    Div,
    Sub,
    Rating,
    RealRating,
    Events,
    Dqs,
    Veri,
    Qual,
    History
}

impl Label {
    pub fn text(&self) -> &'static str {
        match self {
            Label::Week => "WEEK",
            Label::Season => "SEASON",
            Label::SeasonRace => "SEASON_RACE",
            Label::EventStatus => "EVENT_STATUS",
            Label::Car => "CAR",
            Label::Track => "TRACK",
            Label::Desc => "DESC",
            Label::Out => "OUT",
            Label::StatFile => "STATFILE",
            Label::Shape => "SHAPE",
            Label::GoldShift => "GOLD_SHIFT",
            Label::Squeeze => "SQUEEZE",
            Label::Scoot => "SCOOT",
            Label::Weight => "WEIGHT",
            Label::Comment => "COMMENT",
            Label::Image => "IMAGE",
            Label::Report => "REPORT",
            Label::DbFix => "DB_FIX",
            Label::User => "USER",
            Label::Name => "NAME",
            Label::Psn => "PSN",
            Label::Country => "COUNTRY",
            Label::Time => "TIME",
            Label::Total => "TOTAL",
            Label::Split => "SPLIT",
            Label::Sector => "SECTOR",
            Label::Status => "STATUS",
            Label::Disq => "DISQ",
            Label::PlayerId => "PLAYER_ID",
            Label::Div => "DIV",
            Label::Sub => "SUB",
            Label::Rating => "RATING",
            Label::RealRating => "RRATING",
            Label::Events => "EVENTS",
            Label::Dqs => "DQS",
            Label::Veri => "VERI",
            Label::Qual => "QUAL",
            Label::History => "HISTORY"
        }
    }

    /// Case-insensitive, whole-word match.
    pub fn parse(word: &str) -> Option<Label> {
        Label::iter().find(|l| l.text().eq_ignore_ascii_case(word))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Label(Label),
    /// A word that is not a known `Label:`
    Unknown(&'a str)
}

/// Splits one line into `Label: value` pairs. Values are bare words or
/// `"quoted strings"`; a `#` where a label is expected ends the line.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: &'a str
}

impl<'a> Tokens<'a> {
    pub fn new(line: &'a str) -> Tokens<'a> {
        Tokens { rest: line }
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    pub fn is_empty(&self) -> bool {
        self.rest.trim().is_empty()
    }

    /// The next label, `None` at the end of the line or at a comment.
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        self.skip_whitespace();
        if self.rest.is_empty() || self.rest.starts_with('#') {
            self.rest = "";
            return None;
        }

        let end = self
            .rest
            .find(|c: char| c == ':' || c.is_whitespace())
            .unwrap_or(self.rest.len());
        let word = &self.rest[..end];
        let labelled = self.rest[end..].starts_with(':');
        self.rest = if labelled { &self.rest[end + 1..] } else { &self.rest[end..] };

        match Label::parse(word) {
            Some(label) if labelled => Some(Token::Label(label)),
            _ => Some(Token::Unknown(word))
        }
    }

    /// The next value with any quotes removed. `None` when the line is exhausted.
    pub fn value(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        if self.rest.is_empty() {
            return None;
        }

        if let Some(quoted) = self.rest.strip_prefix('"') {
            let end = quoted.find('"').unwrap_or(quoted.len());
            let value = &quoted[..end];
            self.rest = quoted.get(end + 1..).unwrap_or("");
            return Some(value);
        }

        let end = self.rest.find(char::is_whitespace).unwrap_or(self.rest.len());
        let value = &self.rest[..end];
        self.rest = &self.rest[end..];
        Some(value)
    }

    /// Everything left on the line, trimmed.
    pub fn remainder(&mut self) -> &'a str {
        let rest = self.rest.trim();
        self.rest = "";
        rest
    }
}

/// `value` with double quotes turned into single ones, so it fits between the
/// quotes of a store field.
pub fn unquoted(value: &str) -> String {
    value.replace('"', "'")
}

/// Values that look numeric, in order. Anything else is skipped.
pub fn numeric_values(text: &str) -> Vec<f64> {
    text.split_whitespace()
        .filter(|w| w.starts_with(|c: char| c == '-' || c == '.' || c.is_ascii_digit()))
        .filter_map(|w| w.parse().ok())
        .collect()
}
