use std::{
    fmt::Write as _,
    fs, io,
    path::{Path, PathBuf}
};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    database::tokens::{unquoted, Label, Token, Tokens},
    model::{
        constants::MAX_PLAYERS,
        db_structs::Player,
        structures::{
            disqualification::Disqualification, event_status::EventStatus, race_result::RaceResult,
            subdivision::Subdivision
        }
    }
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read player store {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write player store {path}: {source}")]
    Write { path: PathBuf, source: io::Error }
}

const STORE_START: &str = "# WRS DB START";
const STORE_END: &str = "# WRS DB END";

fn number<T: std::str::FromStr>(label: Label, value: Option<&str>, line: usize) -> Option<T> {
    let parsed = value.and_then(|v| v.trim().parse().ok());
    if parsed.is_none() {
        warn!("Store line {}: bad {} value '{}'", line, label.text(), value.unwrap_or_default());
    }
    parsed
}

/// Reads `Week:`, `Event_Status:`, `Rating:`, `Weight:` and `DISQ:` pairs
/// until a label that belongs to something else.
fn parse_result(tokens: &mut Tokens, line: usize) -> RaceResult {
    let mut result = RaceResult::default();

    loop {
        let checkpoint = tokens.clone();
        let label = match tokens.next_token() {
            Some(Token::Label(label)) => label,
            Some(Token::Unknown(word)) => {
                warn!("Store line {}: unknown label '{}'", line, word);
                continue;
            }
            None => break
        };

        match label {
            Label::Week => {
                if let Some(week) = number(label, tokens.value(), line) {
                    result.race_id = week;
                }
            }
            Label::EventStatus => {
                let value = tokens.value().unwrap_or_default();
                match EventStatus::parse(value) {
                    Some(status) => result.status = status,
                    None => warn!("Store line {}: unknown event status '{}'", line, value)
                }
            }
            Label::Rating => {
                if let Some(rating) = number(label, tokens.value(), line) {
                    result.rating = rating;
                }
            }
            Label::Weight => {
                if let Some(weight) = number::<f64>(label, tokens.value(), line) {
                    result.weight = if weight < 0.0 {
                        warn!("Store line {}: negative result weight {}, using 1.0", line, weight);
                        1.0
                    } else {
                        weight
                    };
                }
            }
            Label::Status | Label::Disq => {
                result.disqualification = Disqualification::from_code(tokens.value().unwrap_or_default());
            }
            _ => {
                *tokens = checkpoint;
                break;
            }
        }
    }

    result
}

/// Applies one store line to `current`. A `Player_id:` moves the current
/// player into `players` and opens the next one.
fn read_line(line: &str, line_no: usize, current: &mut Option<Player>, players: &mut Vec<Player>) {
    let mut tokens = Tokens::new(line);

    while let Some(token) = tokens.next_token() {
        let label = match token {
            Token::Label(label) => label,
            Token::Unknown(word) => {
                warn!("Store line {}: unknown label '{}'", line_no, word);
                continue;
            }
        };

        if label == Label::PlayerId {
            players.extend(current.take());
            match number::<usize>(label, tokens.value(), line_no) {
                Some(id) if id > 0 && id < MAX_PLAYERS => *current = Some(Player::new(id as u32, "", "")),
                Some(id) => warn!("Store line {}: player id {} out of range", line_no, id),
                None => {}
            }
            continue;
        }

        let Some(player) = current.as_mut() else {
            warn!("Store line {}: {} outside of a player record", line_no, label.text());
            tokens.value();
            continue;
        };

        match label {
            Label::User => player.name = tokens.value().unwrap_or_default().to_string(),
            Label::Psn | Label::Name => player.tag = tokens.value().unwrap_or_default().to_string(),
            Label::Country => {
                let country = tokens.value().unwrap_or_default();
                player.country = (!country.is_empty()).then(|| country.to_string());
            }
            Label::Div => {
                if let Some(division) = number(label, tokens.value(), line_no) {
                    player.division = division;
                }
            }
            Label::Sub => {
                let value = tokens.value().unwrap_or_default();
                match Subdivision::parse(value) {
                    Some(subdivision) => player.subdivision = subdivision,
                    None => warn!("Store line {}: unknown subdivision '{}'", line_no, value)
                }
            }
            Label::Rating => {
                if let Some(rating) = number::<f64>(label, tokens.value(), line_no).filter(|r| *r > 0.0) {
                    player.rating = rating;
                    if player.real_rating <= 0.0 {
                        player.real_rating = rating;
                    }
                }
            }
            Label::RealRating => {
                if let Some(rating) = number::<f64>(label, tokens.value(), line_no).filter(|r| *r > 0.0) {
                    player.real_rating = rating;
                    if player.rating <= 0.0 {
                        player.rating = rating;
                    }
                }
            }
            Label::Weight => {
                if let Some(weight) = number(label, tokens.value(), line_no) {
                    player.total_weight = weight;
                }
            }
            Label::Events => {
                if let Some(count) = number(label, tokens.value(), line_no) {
                    player.event_count = count;
                }
            }
            Label::Dqs => {
                if let Some(count) = number(label, tokens.value(), line_no) {
                    player.dq_count = count;
                }
            }
            Label::Veri => {
                if let Some(count) = number(label, tokens.value(), line_no) {
                    player.verified_count = count;
                }
            }
            Label::Qual => {
                let mut result = parse_result(&mut tokens, line_no);
                result.race_id = 0;
                player.qualifier = result;
            }
            Label::History => {
                let result = parse_result(&mut tokens, line_no);
                if let Err(dropped) = player.history.load(result) {
                    warn!(
                        "Store line {}: too much history for {}, dropping week {}",
                        line_no,
                        player.display_name(),
                        dropped.race_id
                    );
                }
            }
            other => {
                debug!("Store line {}: ignoring {}", line_no, other.text());
                tokens.value();
            }
        }
    }
}

/// Parses the text player store. Unreadable values are logged and skipped;
/// lines after a bad `Player_id:` have no player to land on and are dropped.
pub fn read_store(text: &str) -> Vec<Player> {
    let mut players = Vec::new();
    let mut current = None;

    for (i, line) in text.lines().enumerate() {
        read_line(line, i + 1, &mut current, &mut players);
        if players.len() >= MAX_PLAYERS {
            warn!("Player store holds more than {} players, ignoring the rest", MAX_PLAYERS);
            return players;
        }
    }
    players.extend(current);

    players
}

fn write_result(out: &mut String, prefix: &str, result: &RaceResult) {
    let _ = write!(
        out,
        "{} Event_Status: {} Rating: {:.6} Weight: {:.6}",
        prefix,
        result.status.letter(),
        result.rating,
        result.weight
    );
    if result.disqualification != Disqualification::Ok {
        let _ = write!(out, " DISQ: {}", result.disqualification.code());
    }
    out.push('\n');
}

fn write_player(out: &mut String, player: &Player) {
    let _ = write!(
        out,
        "Player_id: {} User: \"{}\" PSN: \"{}\" Div: {} Sub: {} Rating: {:.6} RRating: {:.6} Weight: {:.6} Events: {} DQS: {} VERI: {:.6}",
        player.id,
        unquoted(&player.name),
        unquoted(&player.tag),
        player.division,
        player.subdivision.letter(),
        player.rating,
        player.real_rating,
        player.total_weight,
        player.event_count,
        player.dq_count,
        player.verified_count
    );
    if let Some(country) = player.country.as_deref().filter(|c| !c.is_empty()) {
        let _ = write!(out, " Country: \"{}\"", unquoted(country));
    }
    out.push('\n');

    if player.qualifier.is_recorded() {
        write_result(out, "Qual:", &player.qualifier);
    }
    for result in player.history.iter().filter(|r| r.is_recorded()) {
        write_result(out, &format!("History: Week: {}", result.race_id), result);
    }
}

pub fn write_store<'a>(players: impl IntoIterator<Item = &'a Player>) -> String {
    let mut out = format!("{}\n\n", STORE_START);
    for player in players {
        write_player(&mut out, player);
    }
    let _ = writeln!(out, "\n{}", STORE_END);

    out
}

/// Loads the store at `path`. A missing file is an empty store.
pub fn load(path: &Path) -> Result<Vec<Player>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("No player store at {}, starting empty", path.display());
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source
            })
        }
    };

    let players = read_store(&text);
    info!("Loaded {} players from {}", players.len(), path.display());
    Ok(players)
}

pub fn save<'a>(path: &Path, players: impl IntoIterator<Item = &'a Player>) -> Result<(), StoreError> {
    fs::write(path, write_store(players)).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source
    })?;
    info!("Wrote player store {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{read_store, write_store};
    use crate::{
        model::structures::{
            disqualification::Disqualification, event_status::EventStatus, race_result::RaceResult,
            subdivision::Subdivision
        },
        utils::test_utils::generate_player
    };
    use approx::assert_abs_diff_eq;

    const STORE: &str = "# WRS DB START

Player_id: 7 User: \"speedy\" PSN: \"speedy_gt\" Div: 2 Sub: S Rating: 2.400000 RRating: 2.300000 Weight: 3.500000 Events: 5 DQS: 1 VERI: 2.500000 Country: \"NZ\"
Qual: Event_Status: F Rating: 2.800000 Weight: 2.000000
History: Week: 3 Event_Status: F Rating: 2.200000 Weight: 1.000000 DISQ: VERIFIED
History: Week: 4 Event_Status: P Rating: 2.100000 Weight: 0.750000
Player_id: 9 User: \"late\" PSN: \"late_gt\" Div: 0 Sub: G Rating: 0.000000 RRating: 3.100000 Weight: 1.000000 Events: 1 DQS: 0 VERI: 0.000000

# WRS DB END
";

    #[test]
    fn test_read_store() {
        let players = read_store(STORE);
        assert_eq!(players.len(), 2);

        let speedy = &players[0];
        assert_eq!(speedy.id, 7);
        assert_eq!(speedy.name, "speedy");
        assert_eq!(speedy.tag, "speedy_gt");
        assert_eq!(speedy.country.as_deref(), Some("NZ"));
        assert_eq!((speedy.division, speedy.subdivision), (2, Subdivision::Silver));
        assert_abs_diff_eq!(speedy.rating, 2.4);
        assert_abs_diff_eq!(speedy.real_rating, 2.3);
        assert_abs_diff_eq!(speedy.verified_count, 2.5);
        assert_eq!(speedy.event_count, 5);
        assert_eq!(speedy.dq_count, 1);

        assert_eq!(speedy.qualifier.status, EventStatus::Final);
        assert_eq!(speedy.qualifier.race_id, 0);
        assert_abs_diff_eq!(speedy.qualifier.weight, 2.0);

        let weeks: Vec<u32> = speedy.history.iter().map(|r| r.race_id).collect();
        assert_eq!(weeks, vec![4, 3]);
        assert_eq!(
            speedy.history.get(3).map(|r| r.disqualification),
            Some(Disqualification::Verified)
        );
        assert_eq!(speedy.history.get(4).map(|r| r.status), Some(EventStatus::Provisional));
    }

    #[test]
    fn test_missing_rating_falls_back_to_real() {
        let players = read_store(STORE);
        assert_abs_diff_eq!(players[1].rating, 3.1);
        assert!(players[1].country.is_none());
    }

    #[test]
    fn test_bad_player_id_orphans_following_lines() {
        let text = "Player_id: 0 User: \"nobody\"\nHistory: Week: 2 Event_Status: F Rating: 2.0 Weight: 1.0\nPlayer_id: 3 User: \"kept\"\n";
        let players = read_store(text);
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].id, 3);
        assert!(players[0].history.is_empty());
    }

    #[test]
    fn test_negative_result_weight_is_reset() {
        let text = "Player_id: 1\nHistory: Week: 2 Event_Status: F Rating: 2.0 Weight: -4\n";
        let players = read_store(text);
        assert_abs_diff_eq!(players[0].history.get(2).map(|r| r.weight).unwrap(), 1.0);
    }

    #[test]
    fn test_written_store_reads_back() {
        let mut player = generate_player(12, 1.75, 4.0);
        player.country = Some("CA".to_string());
        player.qualifier = RaceResult {
            race_id: 0,
            status: EventStatus::Final,
            disqualification: Disqualification::Ok,
            weight: 2.0,
            rating: 1.9
        };
        player
            .history
            .load(RaceResult {
                race_id: 6,
                status: EventStatus::Final,
                disqualification: Disqualification::Contact,
                weight: 1.0,
                rating: 2.5
            })
            .unwrap();

        let text = write_store([&player]);
        assert!(text.starts_with("# WRS DB START\n\n"));
        assert!(text.ends_with("\n# WRS DB END\n"));
        assert!(text.contains("DISQ: CONTACT"));

        let players = read_store(&text);
        assert_eq!(players.len(), 1);
        let read = &players[0];
        assert_eq!(read.tag, player.tag);
        assert_eq!((read.division, read.subdivision), (player.division, player.subdivision));
        assert_abs_diff_eq!(read.rating, 1.75, epsilon = 1e-6);
        assert_eq!(read.qualifier, player.qualifier);
        assert_eq!(read.history, player.history);
    }

    #[test]
    fn test_quotes_in_names_keep_the_line_readable() {
        let mut player = generate_player(3, 2.25, 5.0);
        player.name = "The \"Rocket\"".to_string();
        player.tag = "R\"1".to_string();
        player.country = Some("\"NZ\"".to_string());

        let players = read_store(&write_store([&player]));
        assert_eq!(players.len(), 1);
        let read = &players[0];
        assert_eq!(read.name, "The 'Rocket'");
        assert_eq!(read.tag, "R'1");
        assert_eq!(read.country.as_deref(), Some("'NZ'"));
        assert_eq!((read.division, read.subdivision), (player.division, player.subdivision));
        assert_abs_diff_eq!(read.rating, 2.25, epsilon = 1e-6);
        assert_abs_diff_eq!(read.total_weight, 5.0, epsilon = 1e-6);
    }
}
