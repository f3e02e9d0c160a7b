use tracing::{debug, warn};

use crate::{
    args::RunMode,
    database::tokens::{numeric_values, unquoted, Label, Token, Tokens},
    model::{
        constants::MAX_SPLITS,
        db_structs::{EventConfig, Submission},
        structures::{
            curve_shape::CurveShape, disqualification::Disqualification, event_status::EventStatus,
            time_value::TimeValue
        }
    }
};

/// One typed value read from an event file line.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Week(u32),
    Season(u32),
    SeasonRace(u32),
    Status(EventStatus),
    Car(String),
    Track(String),
    Description(String),
    Comment(String),
    ResultsFile(String),
    StatsFile(String),
    Shape(CurveShape, Vec<f64>),
    GoldShift(Vec<f64>),
    Squeeze(f64),
    Scoot(f64),
    Weight(f64),
    Mode(RunMode),
    User(String),
    Tag(String),
    Country(String),
    Time(TimeValue),
    Split(TimeValue),
    Disqualification(Disqualification)
}

/// An event file, read into its settings and its submissions in file order.
#[derive(Debug, Clone, Default)]
pub struct ParsedEvent {
    pub config: EventConfig,
    pub submissions: Vec<Submission>,
    pub mode: Option<RunMode>,
    pub stats_file: Option<String>,
    pub results_file: Option<String>
}

fn number<T: std::str::FromStr>(label: Label, value: Option<&str>, line: usize) -> Option<T> {
    let parsed = value.and_then(|v| v.trim().parse().ok());
    if parsed.is_none() {
        warn!("Line {}: failed {} parse: '{}'", line, label.text(), value.unwrap_or_default());
    }
    parsed
}

fn text(value: Option<&str>) -> String {
    unquoted(value.unwrap_or_default())
}

/// Reads the typed fields off one line. Anything unreadable is logged and left out.
pub fn parse_line(line: &str, line_no: usize) -> Vec<Field> {
    let mut fields = Vec::new();
    let mut tokens = Tokens::new(line);

    while let Some(token) = tokens.next_token() {
        let label = match token {
            Token::Label(label) => label,
            Token::Unknown(word) => {
                warn!("Line {}: failed label parse for '{}'", line_no, word);
                continue;
            }
        };

        let field = match label {
            Label::Week => number(label, tokens.value(), line_no).map(Field::Week),
            Label::Season => number(label, tokens.value(), line_no).map(Field::Season),
            Label::SeasonRace => number(label, tokens.value(), line_no).map(Field::SeasonRace),
            Label::EventStatus => {
                let value = tokens.value().unwrap_or_default();
                let status = EventStatus::parse(value);
                if status.is_none() {
                    warn!("Line {}: unknown event status '{}'", line_no, value);
                }
                status.map(Field::Status)
            }
            Label::Car => Some(Field::Car(tokens.remainder().to_string())),
            Label::Track => Some(Field::Track(tokens.remainder().to_string())),
            Label::Desc => Some(Field::Description(tokens.remainder().to_string())),
            Label::Comment => Some(Field::Comment(tokens.remainder().to_string())),
            Label::Out => Some(Field::ResultsFile(tokens.remainder().to_string())),
            Label::StatFile => Some(Field::StatsFile(tokens.remainder().to_string())),
            Label::Image => {
                debug!("Line {}: report images are not rendered", line_no);
                tokens.remainder();
                None
            }
            Label::Shape => {
                let value = tokens.value().unwrap_or_default();
                match CurveShape::from_letter(value) {
                    Some(CurveShape::Custom) => {
                        Some(Field::Shape(CurveShape::Custom, numeric_values(tokens.remainder())))
                    }
                    Some(shape) => Some(Field::Shape(shape, Vec::new())),
                    None => {
                        warn!("Line {}: unknown shape type '{}'", line_no, value);
                        None
                    }
                }
            }
            Label::GoldShift => Some(Field::GoldShift(numeric_values(tokens.remainder()))),
            Label::Squeeze => number(label, tokens.value(), line_no).map(Field::Squeeze),
            Label::Scoot => number(label, tokens.value(), line_no).map(Field::Scoot),
            Label::Weight => number(label, tokens.value(), line_no).map(Field::Weight),
            Label::Report => {
                tokens.value();
                Some(Field::Mode(RunMode::Report))
            }
            Label::DbFix => {
                tokens.value();
                Some(Field::Mode(RunMode::FixWeights))
            }
            Label::User => Some(Field::User(text(tokens.value()))),
            Label::Name | Label::Psn => Some(Field::Tag(text(tokens.value()))),
            Label::Country => Some(Field::Country(text(tokens.value()))),
            Label::Time | Label::Total | Label::Split | Label::Sector => {
                let value = tokens.value().unwrap_or_default();
                match value.parse::<TimeValue>() {
                    Ok(time) if matches!(label, Label::Time | Label::Total) => Some(Field::Time(time)),
                    Ok(time) => Some(Field::Split(time)),
                    Err(e) => {
                        warn!("Line {}: {}", line_no, e);
                        None
                    }
                }
            }
            Label::Status | Label::Disq => Some(Field::Disqualification(Disqualification::from_code(
                tokens.value().unwrap_or_default()
            ))),
            _ => {
                warn!("Line {}: {} is a player store label", line_no, label.text());
                tokens.value();
                None
            }
        };

        fields.extend(field);
    }

    fields
}

impl ParsedEvent {
    fn apply(&mut self, field: Field, line: usize) {
        let config = &mut self.config;

        match field {
            Field::Week(week) => config.week = week,
            Field::Season(season) => config.season = season,
            Field::SeasonRace(race) => config.season_race = race,
            Field::Status(status) => config.status = status,
            Field::Car(car) => config.car = car,
            Field::Track(track) => config.track = track,
            Field::Description(description) => config.description = description,
            Field::Comment(comment) => config.comment = comment,
            Field::ResultsFile(path) => self.results_file = Some(path),
            Field::StatsFile(path) => self.stats_file = Some(path),
            Field::Shape(shape, multipliers) => {
                config.curve.shape = shape;
                config.curve.set_custom_multipliers(&multipliers);
            }
            Field::GoldShift(values) => {
                for (division, value) in (1..).zip(values) {
                    if let Err(e) = config.curve.set_trophy_adjust(division, value) {
                        warn!("Line {}: {}", line, e);
                    }
                }
            }
            Field::Squeeze(squeeze) => {
                if !config.set_squeeze(squeeze) {
                    warn!("Line {}: squeeze {:.3} must be positive, using {:.3}", line, squeeze, config.squeeze);
                }
            }
            Field::Scoot(scoot) => config.set_scoot(scoot),
            Field::Weight(weight) => {
                if !config.set_weight(weight) {
                    warn!("Line {}: weight {:.3} is negative, using {:.3}", line, weight, config.weight);
                }
            }
            Field::Mode(mode) => self.mode = Some(mode),
            Field::User(_)
            | Field::Tag(_)
            | Field::Country(_)
            | Field::Time(_)
            | Field::Split(_)
            | Field::Disqualification(_) => {}
        }
    }
}

/// Builds the submission a line describes. Only lines with a time or a split are submissions.
fn submission(fields: &[Field], line: usize) -> Option<Submission> {
    let mut submission = Submission {
        line,
        ..Default::default()
    };
    let mut timed = false;

    for field in fields {
        match field {
            Field::User(user) => submission.user = Some(user.clone()),
            Field::Tag(tag) => submission.tag = Some(tag.clone()),
            Field::Country(country) => submission.country = Some(country.clone()),
            Field::Time(time) => {
                submission.time = Some(*time);
                timed = true;
            }
            Field::Split(split) => {
                if submission.splits.len() < MAX_SPLITS {
                    submission.splits.push(*split);
                } else {
                    warn!("Line {}: more than {} splits, extra ignored", line, MAX_SPLITS);
                }
                timed = true;
            }
            Field::Disqualification(dq) => submission.disqualification = *dq,
            _ => {}
        }
    }

    timed.then_some(submission)
}

pub fn parse_event(text: &str) -> ParsedEvent {
    let mut parsed = ParsedEvent::default();

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let fields = parse_line(line, line_no);
        if fields.is_empty() {
            continue;
        }

        if let Some(submission) = submission(&fields, line_no) {
            parsed.submissions.push(submission);
        }
        for field in fields {
            parsed.apply(field, line_no);
        }
    }

    debug!(
        "Parsed week {} with {} submissions",
        parsed.config.week,
        parsed.submissions.len()
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::{parse_event, parse_line, Field};
    use crate::{
        args::RunMode,
        model::structures::{
            curve_shape::CurveShape, disqualification::Disqualification, event_status::EventStatus,
            time_value::TimeValue
        }
    };
    use approx::assert_abs_diff_eq;

    const EVENT: &str = "\
# week three
WEEK: 3 SEASON: 2 SEASON_RACE: 7 EVENT_STATUS: F
CAR: Mazda Roadster S
TRACK: Brands Hatch Indy
SHAPE: S
SQUEEZE: 1.4
WEIGHT: 0.5
USER: alice PSN: \"ALI-1\" COUNTRY: GB TIME: 1'02.345 STATUS: V
USER: bob PSN: BOB SPLIT: 30.100 SPLIT: 31.200
USER: carol PSN: CAR COUNTRY: US
";

    #[test]
    fn test_event_settings() {
        let parsed = parse_event(EVENT);
        let config = &parsed.config;

        assert_eq!((config.week, config.season, config.season_race), (3, 2, 7));
        assert_eq!(config.status, EventStatus::Final);
        assert_eq!(config.car, "Mazda Roadster S");
        assert_eq!(config.track, "Brands Hatch Indy");
        assert_eq!(config.curve.shape, CurveShape::Standard);
        assert_abs_diff_eq!(config.squeeze, 1.4);
        assert!(!config.auto_squeeze);
        assert!(config.auto_scoot);
        assert_abs_diff_eq!(config.weight, 0.5);
    }

    #[test]
    fn test_submissions() {
        let parsed = parse_event(EVENT);
        assert_eq!(parsed.submissions.len(), 2);

        let alice = &parsed.submissions[0];
        assert_eq!(alice.line, 8);
        assert_eq!(alice.tag.as_deref(), Some("ALI-1"));
        assert_eq!(alice.country.as_deref(), Some("GB"));
        assert_eq!(alice.time, Some(TimeValue::from_parts(1, 2, 345)));
        assert_eq!(alice.disqualification, Disqualification::Verified);

        let bob = &parsed.submissions[1];
        assert_eq!(bob.time, None);
        assert_eq!(bob.resolve().0, TimeValue::from_millis(61_300));
    }

    #[test]
    fn test_rejected_settings_fall_back() {
        let parsed = parse_event("SQUEEZE: -1\nWEIGHT: -3\nSCOOT: 0.2\n");

        assert_abs_diff_eq!(parsed.config.squeeze, 1.2);
        assert!(!parsed.config.auto_squeeze);
        assert_abs_diff_eq!(parsed.config.weight, 1.0);
        assert_abs_diff_eq!(parsed.config.scoot, 0.2);
        assert!(!parsed.config.auto_scoot);
    }

    #[test]
    fn test_custom_shape_and_gold_shift() {
        let parsed = parse_event("SHAPE: C -0.5 0 1 2 3.5\nGOLD_SHIFT: 0.1 0.9 -0.2\n");
        let curve = &parsed.config.curve;

        assert_eq!(curve.shape, CurveShape::Custom);
        assert_abs_diff_eq!(curve.multipliers()[4], 3.5);
        assert_abs_diff_eq!(curve.trophy_adjust(1), 0.1);
        assert_abs_diff_eq!(curve.trophy_adjust(2), 0.0);
        assert_abs_diff_eq!(curve.trophy_adjust(3), -0.2);
    }

    #[test]
    fn test_mode_labels() {
        assert_eq!(parse_event("REPORT: 1\n").mode, Some(RunMode::Report));
        assert_eq!(parse_event("DB_FIX: 1\n").mode, Some(RunMode::FixWeights));
        assert_eq!(parse_event("WEEK: 1\n").mode, None);
    }

    #[test]
    fn test_unreadable_values_are_skipped() {
        let fields = parse_line("WEEK: three TIME: abc USER: dan", 1);
        assert_eq!(fields, vec![Field::User("dan".to_string())]);

        let fields = parse_line("USER: dan TIME: 999999999999999'00.000", 2);
        assert_eq!(fields, vec![Field::User("dan".to_string())]);
    }

    #[test]
    fn test_stray_quotes_in_names() {
        let fields = parse_line("USER: al\"ex PSN: R\"1", 1);
        assert_eq!(
            fields,
            vec![Field::User("al'ex".to_string()), Field::Tag("R'1".to_string())]
        );
    }

    #[test]
    fn test_comment_ends_line() {
        let fields = parse_line("USER: erin # TIME: 1'00.000", 1);
        assert_eq!(fields, vec![Field::User("erin".to_string())]);
    }
}
