//! Interactive menu loop.

use std::io::{self, Write};
use std::path::PathBuf;

use scriptrelay_client::transport::WorkerTransport;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::app::App;
use crate::report;
use crate::steps;

const MENU: &str = "
MENU
1. Submit composite job
2. View session
3. List prior sessions
4. Session report
5. Test worker connection
0. Exit
Select an option: ";

/// Read choices from `input` until `0` or end of input.
///
/// Recoverable errors are printed and the loop continues. `Err` is
/// returned only when the session cannot continue (session log failure
/// or a broken output stream).
pub async fn run_menu<T, R, W>(app: &App<T>, mut input: R, out: &mut W) -> anyhow::Result<()>
where
    T: WorkerTransport,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "scriptrelay")?;
    writeln!(out, "Worker: {}", app.config().client.worker_url)?;
    writeln!(out, "Session log: {}", app.store().path().display())?;

    loop {
        write!(out, "{MENU}")?;
        out.flush()?;

        let line = match next_line(&mut input, out).await? {
            Input::Line(line) => line,
            Input::Unreadable => continue,
            Input::End => break,
        };

        match line.trim() {
            "1" => {
                write!(out, "Script files or directories: ")?;
                out.flush()?;
                let answer = match next_line(&mut input, out).await? {
                    Input::Line(answer) => answer,
                    Input::Unreadable => continue,
                    Input::End => break,
                };
                let paths: Vec<PathBuf> = answer.split_whitespace().map(PathBuf::from).collect();
                if paths.is_empty() {
                    writeln!(out, "No paths given.")?;
                    continue;
                }
                match steps::load_steps(&paths).await {
                    Ok(steps) => {
                        app.run_steps(steps, out).await?;
                    }
                    Err(e) => writeln!(out, "Error: {e}")?,
                }
            }
            "2" => {
                let log = app.store().snapshot().await;
                write!(out, "{}", report::session_view(&log))?;
            }
            "3" => match scriptrelay_store::list_sessions(&app.config().session_dir).await {
                Ok(listings) => write!(out, "{}", report::session_listing(&listings))?,
                Err(e) => writeln!(out, "Error: {e}")?,
            },
            "4" => {
                let log = app.store().snapshot().await;
                write!(out, "{}", report::session_report(&log, app.store().path()))?;
            }
            "5" => {
                writeln!(out, "Testing connection to {}...", app.config().client.worker_url)?;
                out.flush()?;
                match app.client().check_connection().await {
                    Ok(0) => writeln!(out, "Worker connection is open.")?,
                    Ok(attempts) => writeln!(out, "Connected to worker ({attempts} attempt(s)).")?,
                    Err(e) if e.is_fatal() => return Err(e.into()),
                    Err(e) => writeln!(out, "Worker unreachable: {e}")?,
                }
            }
            "0" => break,
            "" => {}
            other => writeln!(out, "Invalid choice {other:?}. Please select 0-5.")?,
        }
    }

    let total = app.store().snapshot().await.total_count();
    writeln!(out, "\nSession summary: {total} job(s) recorded")?;
    out.flush()?;
    Ok(())
}

enum Input {
    Line(String),
    /// The line was consumed but is not UTF-8; the error is already printed.
    Unreadable,
    End,
}

async fn next_line<R, W>(input: &mut R, out: &mut W) -> io::Result<Input>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut buf = Vec::new();
    if input.read_until(b'\n', &mut buf).await? == 0 {
        return Ok(Input::End);
    }
    match String::from_utf8(buf) {
        Ok(line) => Ok(Input::Line(line.trim_end_matches(['\r', '\n']).to_string())),
        Err(e) => {
            let err = io::Error::new(io::ErrorKind::InvalidData, e);
            writeln!(out, "Error: {err}")?;
            Ok(Input::Unreadable)
        }
    }
}
