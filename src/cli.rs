// src/cli.rs
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::config::options::Options;
use crate::model::{parse_date, Division, Gender, Slot};
use crate::{ledger, merge, table};

type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Failed,
    SaveFailed,
    Pending,
    Mark,
    Exists,
    Ids,
    Validate,
    Rows,
    Flag,
    Merge,
    Help,
}

#[derive(Clone, Debug)]
pub struct Params {
    pub command: Command,
    pub options: Options,
    pub date: Option<NaiveDate>,
    pub game: Option<String>,
    pub division: Option<Division>,
    pub gender: Option<Gender>,
    pub error_type: String,
    pub message: String,
    pub success: Option<bool>,
    pub positional: Vec<String>,
}

impl Params {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            options: Options::default(),
            date: None,
            game: None,
            division: None,
            gender: None,
            error_type: s!(crate::config::consts::SOFT_FAILURE_TYPE),
            message: s!(),
            success: None,
            positional: Vec::new(),
        }
    }

    fn slot(&self) -> CliResult<Slot> {
        Ok(Slot::new(
            self.date.ok_or("Missing --date")?,
            self.division.ok_or("Missing --division")?,
            self.gender.ok_or("Missing --gender")?,
        ))
    }

    fn game(&self) -> CliResult<&str> {
        Ok(self.game.as_deref().ok_or("Missing --game")?)
    }

    fn arg(&self, i: usize, what: &str) -> CliResult<&str> {
        self.positional.get(i).map(|s| s.as_str()).ok_or_else(|| format!("Missing {what}").into())
    }

    fn path_arg(&self, i: usize, what: &str) -> CliResult<&Path> {
        self.arg(i, what).map(Path::new)
    }
}

/// Parse arguments (without the program name).
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> CliResult<Params> {
    let mut args = args.into_iter();
    let command = match args.next().as_deref() {
        None | Some("-h") | Some("--help") | Some("help") => Command::Help,
        Some("failed") => Command::Failed,
        Some("save-failed") => Command::SaveFailed,
        Some("pending") => Command::Pending,
        Some("mark") => Command::Mark,
        Some("exists") => Command::Exists,
        Some("ids") => Command::Ids,
        Some("validate") => Command::Validate,
        Some("rows") => Command::Rows,
        Some("flag") => Command::Flag,
        Some("merge") => Command::Merge,
        Some(other) => return Err(format!("Unknown command: {other}").into()),
    };
    let mut params = Params::new(command);

    while let Some(a) = args.next() {
        match a.as_str() {
            "--failed-games-file" => params.options.failed_games_file = PathBuf::from(args.next().ok_or("Missing value for --failed-games-file")?),
            "--out-dir" | "-o" => params.options.out_dir = PathBuf::from(args.next().ok_or("Missing value for --out-dir")?),
            "--log-file" => params.options.log_file = Some(PathBuf::from(args.next().ok_or("Missing value for --log-file")?)),
            "--date" | "-d" => {
                let v = args.next().ok_or("Missing value for --date")?;
                params.date = Some(parse_date(&v)?);
            }
            "--game" | "-g" => params.game = Some(args.next().ok_or("Missing value for --game")?),
            "--division" => params.division = Some(args.next().ok_or("Missing value for --division")?.parse()?),
            "--gender" => params.gender = Some(args.next().ok_or("Missing value for --gender")?.parse()?),
            "--error-type" => params.error_type = args.next().ok_or("Missing value for --error-type")?,
            "--message" => params.message = args.next().ok_or("Missing value for --message")?,
            "--success" => params.success = Some(true),
            "--failure" => params.success = Some(false),
            "-h" | "--help" => params.command = Command::Help,
            flag if flag.starts_with("--") => return Err(format!("Unknown arg: {flag}").into()),
            _ => params.positional.push(a),
        }
    }

    Ok(params)
}

/// Run one command. `Ok(false)` means the operation answered "no" / failed
/// softly; the binary turns that into exit code 1.
pub fn run(params: &Params) -> CliResult<bool> {
    let ledger_path = params.options.ledger_path();

    match params.command {
        Command::Help => {
            println!("{}", include_str!("cli_help.txt"));
            Ok(true)
        }
        Command::Failed => {
            let ledger = ledger::load(ledger_path, params.date);
            println!("{}", ledger.to_json()?);
            Ok(true)
        }
        Command::SaveFailed => {
            let slot = params.slot()?;
            Ok(ledger::save(
                ledger_path,
                params.game()?,
                slot.date,
                slot.division,
                slot.gender,
                &params.error_type,
                &params.message,
            ))
        }
        Command::Pending => {
            let date = params.date.ok_or("Missing --date")?;
            let ledger = ledger::load(ledger_path, Some(date));
            let slots = match (params.division, params.gender) {
                (Some(d), Some(g)) => vec![Slot::new(date, d, g)],
                _ => ledger.slots(date),
            };
            for slot in slots {
                for link in ledger::query(&ledger, date, slot.division, slot.gender) {
                    println!("{}\t{}\t{link}", slot.division, slot.gender);
                }
            }
            Ok(true)
        }
        Command::Mark => {
            let slot = params.slot()?;
            let success = params.success.ok_or("Specify --success or --failure")?;
            Ok(ledger::mark_retried(ledger_path, params.game()?, slot.date, slot.division, slot.gender, success))
        }
        Command::Exists => {
            let found = table::exists(params.path_arg(0, "table path")?, params.arg(1, "game id")?);
            println!("{found}");
            Ok(found)
        }
        Command::Ids => {
            for id in table::identity_set(params.path_arg(0, "table path")?) {
                println!("{id}");
            }
            Ok(true)
        }
        Command::Validate => {
            let ok = table::validate_structure(params.path_arg(0, "table path")?);
            println!("{ok}");
            Ok(ok)
        }
        Command::Rows => {
            match table::rows_for_link(params.path_arg(0, "table path")?, params.arg(1, "game link")?) {
                Some(rows) => {
                    print!("{}", crate::csv::table_to_string(&rows));
                    Ok(true)
                }
                None => Ok(false),
            }
        }
        Command::Flag => {
            let value = match params.positional.get(2) {
                Some(v) => crate::schema::decode_bool(v).ok_or_else(|| format!("Not a boolean: {v}"))?,
                None => true,
            };
            Ok(table::set_duplicate_flag(params.path_arg(0, "table path")?, params.arg(1, "game link")?, value))
        }
        Command::Merge => Ok(merge::merge(
            params.path_arg(0, "existing table")?,
            params.path_arg(1, "new table")?,
            params.path_arg(2, "output path")?,
        )),
    }
}
