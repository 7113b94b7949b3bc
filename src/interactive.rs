//! Line-driven interactive session and the start-up menu.
//!
//! Both read from any [`BufRead`] and write prompts to any [`Write`], so the
//! binary hands them stdin/stdout and tests hand them byte buffers.

use std::io::{self, BufRead, Write};

use crate::commands::{Command, USAGE};
use crate::shared::SharedDriver;
use crate::traits::Gpio;

/// Help text printed when a session starts.
pub const HELP: &str = "\
Commands:
  Motor A: af (forward), ab (backward), as (stop)
  Motor B: bf (forward), bb (backward), bs (stop)
  Both: stop (stop all), q (quit)";

/// Prompt printed before every line is read.
pub const PROMPT: &str = "Enter command: ";

/// Errors that end a session early.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Reading input or writing a prompt failed.
    #[error("terminal I/O failed")]
    Io(#[from] io::Error),
}

/// How a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user typed `q`.
    Quit,
    /// Input was exhausted.
    EndOfInput,
}

/// Counters for a finished session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    /// Commands the driver accepted.
    pub applied: usize,
    /// Lines that were not commands.
    pub unknown: usize,
    /// Commands the driver rejected or failed to apply.
    pub failed: usize,
    /// Why the loop stopped.
    pub end: SessionEnd,
}

/// Read commands until `q` or end of input.
///
/// Motion commands run at `speed` percent. Unknown input prints the usage
/// line; driver errors are logged. Neither ends the session.
///
/// ```rust
/// use std::io::Cursor;
/// use tb6612_bringup::interactive::{run_interactive, SessionEnd};
/// use tb6612_bringup::{hal::SimGpio, PinMap, SharedDriver, Tb6612};
///
/// let driver = SharedDriver::new(Tb6612::new(SimGpio::new(), PinMap::default()));
/// driver.with_driver(|d| d.initialize()).unwrap();
///
/// let mut out = Vec::new();
/// let summary = run_interactive(&driver, Cursor::new("af\nbb\nq\n"), &mut out, 50).unwrap();
///
/// assert_eq!(summary.applied, 2);
/// assert_eq!(summary.end, SessionEnd::Quit);
/// assert_eq!(driver.state().motor_a.speed, 50);
/// ```
pub fn run_interactive<G, R, W>(
    driver: &SharedDriver<G>,
    mut input: R,
    output: &mut W,
    speed: i32,
) -> Result<SessionSummary, SessionError>
where
    G: Gpio,
    R: BufRead,
    W: Write + ?Sized,
{
    log::info!("Starting Interactive Mode");
    writeln!(output, "{HELP}")?;

    let mut summary = SessionSummary {
        applied: 0,
        unknown: 0,
        failed: 0,
        end: SessionEnd::EndOfInput,
    };
    let mut line = String::new();

    loop {
        write!(output, "\n{PROMPT}")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }

        let cmd = match Command::parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(unknown) => {
                log::debug!("{unknown}");
                writeln!(output, "{USAGE}")?;
                summary.unknown += 1;
                continue;
            }
        };

        if cmd == Command::Quit {
            summary.end = SessionEnd::Quit;
            break;
        }

        match driver.with_driver(|d| cmd.apply(d, speed)) {
            Ok(()) => summary.applied += 1,
            Err(err) => {
                log::error!("'{cmd}' failed: {err}");
                summary.failed += 1;
            }
        }
    }

    log::info!("Exiting interactive mode");
    Ok(summary)
}

/// Session selected from the start-up menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Scripted demo.
    Demo,
    /// Interactive session.
    Interactive,
}

impl Mode {
    /// Map a menu answer (`1` or `2`) to a mode.
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Mode::Demo),
            "2" => Some(Mode::Interactive),
            _ => None,
        }
    }
}

/// Print the menu and read one answer.
///
/// Returns `Ok(None)` for anything other than `1` or `2`, including end of
/// input.
pub fn prompt_mode<R, W>(mut input: R, output: &mut W) -> io::Result<Option<Mode>>
where
    R: BufRead,
    W: Write + ?Sized,
{
    writeln!(output, "TB6612FNG Motor Test")?;
    writeln!(output, "1. Run automated test")?;
    writeln!(output, "2. Interactive mode")?;
    write!(output, "Choose option (1 or 2): ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(Mode::from_choice(&line))
}
