//! Line-oriented command front end.
//!
//! Sections and markers are numbered from 1 on screen; commands convert to
//! the 0-based indices the session uses.

use anyhow::{anyhow, bail, Context, Result};
use cutlist_core::{CutlistConfig, TimecodeCodec};
use cutlist_media::{
    export_session, ExportGate, ExportOptions, FfmpegSink, FfplayPreview, MediaSource,
    PreviewController, ProbedSource, StaticSource,
};
use cutlist_timeline::{EditingSession, InteractionMode, SectionState, SessionCommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const HELP: &str = "\
Commands:
  open <file>              load a media file (duration via ffprobe)
  blank <seconds>          load an empty timeline of the given length
  add <timecode>           add a cut point (HH:MM:SS:mmm, MM:SS:mmm, HH:MM:SS ...)
  remove <n>               remove marker n
  click <x> <width>        remove the marker under pixel x on a bar of that width
  undo                     remove the most recently added marker
  toggle <n>               flip section n between Keep and Delete
  keep <n> | delete <n>    set the state of section n
  gap <seconds>            silence between kept sections
  sections | markers       list sections or markers
  preview <n>              play section n
  pick <x> <width>         play the section under pixel x on a bar of that width
  stop                     stop the preview
  plan                     print the assembly plan as JSON
  build <output> [image]   write audio, or video over a background image
  help | quit";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Session(SessionCommand),
    Open(PathBuf),
    Sections,
    Markers,
    Click { x: f32, width: f32 },
    Pick { x: f32, width: f32 },
    Preview { index: usize },
    Stop,
    Plan,
    Build {
        output: PathBuf,
        image: Option<PathBuf>,
    },
    Help,
    Quit,
}

fn one_based(arg: Option<&str>, what: &str) -> Result<usize> {
    let arg = arg.ok_or_else(|| anyhow!("missing {what} number"))?;
    let n: usize = arg
        .parse()
        .with_context(|| format!("invalid {what} number: {arg}"))?;
    n.checked_sub(1)
        .ok_or_else(|| anyhow!("{what} numbers start at 1"))
}

fn number<T: std::str::FromStr>(arg: Option<&str>, what: &str) -> Result<T> {
    let arg = arg.ok_or_else(|| anyhow!("missing {what}"))?;
    arg.parse().map_err(|_| anyhow!("invalid {what}: {arg}"))
}

/// Parse a line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ReplCommand>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();
    let arg = |i: usize| rest.get(i).copied();

    let cmd = match verb {
        "open" => ReplCommand::Open(PathBuf::from(
            arg(0).ok_or_else(|| anyhow!("missing file"))?,
        )),
        "blank" => ReplCommand::Session(SessionCommand::LoadMedia {
            duration: number(arg(0), "duration")?,
            path: None,
        }),
        "add" => ReplCommand::Session(SessionCommand::AddCutPointAtTimecode {
            text: rest.join(" "),
        }),
        "remove" => ReplCommand::Session(SessionCommand::RemoveCutPointAt {
            index: one_based(arg(0), "marker")?,
        }),
        "undo" => ReplCommand::Session(SessionCommand::UndoLast),
        "toggle" => ReplCommand::Session(SessionCommand::ToggleSection {
            index: one_based(arg(0), "section")?,
        }),
        "keep" | "delete" => ReplCommand::Session(SessionCommand::SetSectionState {
            index: one_based(arg(0), "section")?,
            state: if verb == "keep" {
                SectionState::Keep
            } else {
                SectionState::Delete
            },
        }),
        "gap" => ReplCommand::Session(SessionCommand::SetSilenceGap {
            text: rest.join(" "),
        }),
        "click" => ReplCommand::Click {
            x: number(arg(0), "x")?,
            width: number(arg(1), "width")?,
        },
        "pick" => ReplCommand::Pick {
            x: number(arg(0), "x")?,
            width: number(arg(1), "width")?,
        },
        "sections" => ReplCommand::Sections,
        "markers" => ReplCommand::Markers,
        "preview" => ReplCommand::Preview {
            index: one_based(arg(0), "section")?,
        },
        "stop" => ReplCommand::Stop,
        "plan" => ReplCommand::Plan,
        "build" => ReplCommand::Build {
            output: PathBuf::from(arg(0).ok_or_else(|| anyhow!("missing output path"))?),
            image: arg(1).map(PathBuf::from),
        },
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => bail!("unknown command: {other} (try `help`)"),
    };
    Ok(Some(cmd))
}

/// Interactive editing state.
pub struct Repl {
    config: CutlistConfig,
    session: EditingSession,
    source: Option<Box<dyn MediaSource>>,
    preview: Option<PreviewController<FfplayPreview>>,
    sink: FfmpegSink,
    gate: ExportGate,
}

impl Repl {
    pub fn new(config: CutlistConfig) -> Self {
        Self {
            session: EditingSession::new(config.editing.clone()),
            sink: FfmpegSink::new(config.tools.ffmpeg.clone()),
            config,
            source: None,
            preview: None,
            gate: ExportGate::new(),
        }
    }

    /// Probe `path` and load it into the session.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        let source = ProbedSource::probe(path, &self.config.tools.ffprobe)?;
        self.session
            .load_media(source.duration(), Some(path.to_path_buf()))?;
        self.preview = Some(PreviewController::new(FfplayPreview::new(
            self.config.tools.ffplay.clone(),
            path,
        )));
        info!(path = %path.display(), duration = source.duration(), "Opened media");
        self.source = Some(Box::new(source));
        Ok(())
    }

    /// Read commands from `input` until EOF or `quit`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> Result<()> {
        write!(out, "> ")?;
        out.flush()?;
        for line in input.lines() {
            let line = line?;
            let keep_going = match parse_line(&line) {
                Ok(Some(cmd)) => match self.execute(cmd, &mut out) {
                    Ok(keep_going) => keep_going,
                    Err(e) => {
                        writeln!(out, "error: {e:#}")?;
                        true
                    }
                },
                Ok(None) => true,
                Err(e) => {
                    writeln!(out, "error: {e:#}")?;
                    true
                }
            };
            if !keep_going {
                return Ok(());
            }
            write!(out, "> ")?;
            out.flush()?;
        }
        Ok(())
    }

    /// Run one command. Returns `false` on quit.
    pub fn execute<W: Write>(&mut self, cmd: ReplCommand, out: &mut W) -> Result<bool> {
        debug!(command = ?cmd, "Executing");
        match cmd {
            ReplCommand::Session(cmd) => {
                let outcome = cmd.apply(&mut self.session)?;
                if let SessionCommand::LoadMedia { duration, .. } = cmd {
                    self.source = Some(Box::new(StaticSource::new(duration)));
                    self.preview = None;
                }
                writeln!(out, "{outcome}")?;
            }
            ReplCommand::Open(path) => {
                self.open(&path)?;
                let duration = self.session.timeline().map_or(0.0, |t| t.duration());
                writeln!(
                    out,
                    "Opened {} ({})",
                    path.display(),
                    TimecodeCodec::format_precise(duration)
                )?;
            }
            ReplCommand::Sections => {
                for section in self.session.sections()? {
                    writeln!(out, "{section}")?;
                }
            }
            ReplCommand::Markers => {
                let timeline = self
                    .session
                    .timeline()
                    .ok_or(cutlist_core::CutlistError::NoMediaLoaded)?;
                for (i, &cut) in timeline.cut_points().iter().enumerate() {
                    writeln!(out, "{:>3}  {}", i + 1, TimecodeCodec::format_precise(cut))?;
                }
            }
            ReplCommand::Click { x, width } => {
                match self.session.remove_marker_at_position(x, width)? {
                    Some(time) => writeln!(
                        out,
                        "Removed marker at {}",
                        TimecodeCodec::format_precise(time)
                    )?,
                    None => writeln!(out, "No marker at x={x}")?,
                }
            }
            ReplCommand::Pick { x, width } => {
                let index = self
                    .session
                    .marker_index(width, InteractionMode::ReadOnly)?
                    .section_at(x)
                    .ok_or_else(|| anyhow!("x={x} is outside the bar"))?;
                self.preview_section(index, out)?;
            }
            ReplCommand::Preview { index } => self.preview_section(index, out)?,
            ReplCommand::Stop => {
                if let Some(preview) = self.preview.as_mut() {
                    preview.cancel();
                }
            }
            ReplCommand::Plan => {
                writeln!(out, "{}", self.session.build_plan()?.to_json()?)?;
            }
            ReplCommand::Build { output, image } => {
                let source = self
                    .source
                    .as_deref()
                    .ok_or(cutlist_core::CutlistError::NoMediaLoaded)?;
                let options = match image {
                    Some(image) => ExportOptions::video_with_background(
                        output,
                        Some(image),
                        &self.config.export,
                    ),
                    None => ExportOptions::audio_only(output, &self.config.export),
                };
                let artifact =
                    export_session(&self.session, source, &self.sink, &options, &self.gate)?;
                writeln!(
                    out,
                    "Wrote {} ({})",
                    artifact.path.display(),
                    TimecodeCodec::format_precise(artifact.duration)
                )?;
            }
            ReplCommand::Help => writeln!(out, "{HELP}")?,
            ReplCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn preview_section<W: Write>(&mut self, index: usize, out: &mut W) -> Result<()> {
        let range = self.session.section_range(index)?;
        let preview = self
            .preview
            .as_mut()
            .ok_or_else(|| anyhow!("preview needs a media file (use `open`)"))?;
        preview.preview(range)?;
        writeln!(
            out,
            "Playing section {} ({} - {})",
            index + 1,
            TimecodeCodec::format_display(range.start),
            TimecodeCodec::format_display(range.end)
        )?;
        Ok(())
    }
}
