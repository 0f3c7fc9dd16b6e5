//! Filename and command pattern evaluation.
//!
//! Patterns mix literal text, strftime-style `%` calendar escapes, `$`
//! program variables and `\` literal escapes:
//!
//! | escape | meaning |
//! |--------|---------|
//! | `$i`   | framebuffer device index |
//! | `$f`   | full path of the saved image (command patterns only) |
//! | `$n`   | basename of the saved image (command patterns only) |
//! | `$p`   | width times height |
//! | `$w`   | width |
//! | `$h`   | height |
//! | `$$`   | literal `$` |
//! | `\n`   | newline; any other `\c` is a literal `c` |
//! | `%X`   | calendar field, expanded with the current local time |
//!
//! Evaluation renders into a bounded buffer that is doubled and retried
//! whenever it overflows, so a single oversized substitution never costs
//! more than one extra pass.

use crate::error::PatternError;
use chrono::format::StrftimeItems;
use chrono::{DateTime, Local};
use std::fmt::{self, Write as _};

/// Byte standing in for an argument boundary in rendered command strings.
///
/// 0xFF never occurs in UTF-8 text, so splitting the rendered command back
/// into an argument vector is unambiguous.
pub const ARG_SEPARATOR: u8 = 0xff;

/// Initial evaluation buffer capacity; doubled on overflow.
const INITIAL_CAPACITY: usize = 32;

/// Inputs available to `$` variables during one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct PatternVars<'a> {
    /// Framebuffer device index (`$i`).
    pub device: u32,
    /// Frame width in pixels (`$w`).
    pub width: u32,
    /// Frame height in pixels (`$h`).
    pub height: u32,
    /// Saved image path (`$f`, `$n`). `None` while the filename pattern
    /// itself is being evaluated, which also selects path-template mode:
    /// unescaped spaces stay literal instead of becoming argument
    /// separators, and `$f`/`$n` silently expand to nothing.
    pub path: Option<&'a str>,
}

/// Evaluate `pattern` into its rendered byte string.
///
/// In command-template mode (`vars.path` is set) unescaped spaces become
/// [`ARG_SEPARATOR`] bytes; split them out with [`split_command`]. In
/// path-template mode the result is plain UTF-8.
pub fn evaluate(pattern: &str, vars: &PatternVars) -> Result<Vec<u8>, PatternError> {
    evaluate_at(pattern, vars, Local::now())
}

/// [`evaluate`] with an explicit timestamp.
///
/// Retries share the timestamp, so repeated passes over the same inputs
/// render identically; tests use this to pin the calendar fields.
pub fn evaluate_at(
    pattern: &str,
    vars: &PatternVars,
    now: DateTime<Local>,
) -> Result<Vec<u8>, PatternError> {
    let mut capacity = INITIAL_CAPACITY;
    loop {
        match try_evaluate(pattern, vars, &now, capacity) {
            Err(PatternError::BufferTooSmall) => capacity *= 2,
            result => return result,
        }
    }
}

/// Evaluate a filename pattern into a path string.
pub fn evaluate_path(
    pattern: &str,
    device: u32,
    width: u32,
    height: u32,
) -> Result<String, PatternError> {
    let vars = PatternVars {
        device,
        width,
        height,
        path: None,
    };
    String::from_utf8(evaluate(pattern, &vars)?).map_err(|_| PatternError::Format)
}

/// Evaluate a command pattern and split it into its argument vector.
pub fn evaluate_command(
    pattern: &str,
    device: u32,
    width: u32,
    height: u32,
    path: &str,
) -> Result<Vec<String>, PatternError> {
    let vars = PatternVars {
        device,
        width,
        height,
        path: Some(path),
    };
    Ok(split_command(&evaluate(pattern, &vars)?))
}

/// Split a rendered command string on the argument separator.
///
/// Consecutive or edge separators yield empty arguments; they are kept,
/// not collapsed.
pub fn split_command(rendered: &[u8]) -> Vec<String> {
    rendered
        .split(|&b| b == ARG_SEPARATOR)
        .map(|token| String::from_utf8_lossy(token).into_owned())
        .collect()
}

/// Bounded output buffer with explicit overflow reporting.
struct EvalBuf {
    data: Vec<u8>,
    capacity: usize,
}

impl EvalBuf {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, byte: u8) -> Result<(), PatternError> {
        if self.data.len() >= self.capacity {
            return Err(PatternError::BufferTooSmall);
        }
        self.data.push(byte);
        Ok(())
    }

    fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), PatternError> {
        for &b in bytes {
            self.push(b)?;
        }
        Ok(())
    }

    fn push_char(&mut self, c: char) -> Result<(), PatternError> {
        let mut tmp = [0u8; 4];
        self.push_bytes(c.encode_utf8(&mut tmp).as_bytes())
    }
}

fn try_evaluate(
    pattern: &str,
    vars: &PatternVars,
    now: &DateTime<Local>,
    capacity: usize,
) -> Result<Vec<u8>, PatternError> {
    let mut buf = EvalBuf::with_capacity(capacity);
    scan_pattern(&mut buf, pattern, vars)?;
    if buf.data.contains(&b'%') {
        format_calendar(&mut buf, now)?;
    }
    Ok(buf.data)
}

/// Parser state of the character scan. The states are mutually exclusive;
/// each escape consumes exactly one following character.
enum ScanState {
    Normal,
    Percent,
    Backslash,
    Dollar,
}

/// First pass: expand `$` and `\`, mark spaces, pass `%` escapes through
/// untouched for the calendar pass.
fn scan_pattern(buf: &mut EvalBuf, pattern: &str, vars: &PatternVars) -> Result<(), PatternError> {
    let mut state = ScanState::Normal;
    for c in pattern.chars() {
        match state {
            ScanState::Dollar => {
                state = ScanState::Normal;
                substitute(buf, c, vars)?;
            }
            ScanState::Backslash => {
                state = ScanState::Normal;
                if c == 'n' {
                    buf.push(b'\n')?;
                } else {
                    buf.push_char(c)?;
                }
            }
            ScanState::Percent => {
                state = ScanState::Normal;
                buf.push_char(c)?;
            }
            ScanState::Normal => match c {
                '%' => {
                    buf.push(b'%')?;
                    state = ScanState::Percent;
                }
                '\\' => state = ScanState::Backslash,
                '$' => state = ScanState::Dollar,
                ' ' if vars.path.is_some() => buf.push(ARG_SEPARATOR)?,
                _ => buf.push_char(c)?,
            },
        }
    }
    Ok(())
}

/// Expand one `$` variable.
fn substitute(buf: &mut EvalBuf, var: char, vars: &PatternVars) -> Result<(), PatternError> {
    if var == 'f' || var == 'n' {
        // The output path does not exist yet while the filename pattern
        // itself is being evaluated; the substitution contributes nothing.
        let Some(path) = vars.path else {
            return Ok(());
        };
        let text = if var == 'n' { basename(path) } else { path };
        let from = buf.data.len();
        buf.push_bytes(text.as_bytes())?;
        return duplicate_percents(buf, from);
    }
    match var {
        'i' => buf.push_bytes(vars.device.to_string().as_bytes()),
        'p' => {
            let pixels = u64::from(vars.width) * u64::from(vars.height);
            buf.push_bytes(pixels.to_string().as_bytes())
        }
        'w' => buf.push_bytes(vars.width.to_string().as_bytes()),
        'h' => buf.push_bytes(vars.height.to_string().as_bytes()),
        '$' => buf.push(b'$'),
        other => Err(PatternError::UnknownVariable(other)),
    }
}

/// Substring after the last `/`, or the whole path if there is none.
fn basename(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// Double every `%` in `buf` starting at `from`.
///
/// Literal percents inside substituted paths would otherwise be taken as
/// calendar escapes by the second pass. Fails with `BufferTooSmall` when
/// the doubled text does not fit.
fn duplicate_percents(buf: &mut EvalBuf, from: usize) -> Result<(), PatternError> {
    let percents = buf.data[from..].iter().filter(|&&b| b == b'%').count();
    if buf.data.len() + percents > buf.capacity {
        return Err(PatternError::BufferTooSmall);
    }
    let mut i = from;
    while i < buf.data.len() {
        if buf.data[i] == b'%' {
            buf.data.insert(i, b'%');
            i += 1;
        }
        i += 1;
    }
    Ok(())
}

/// Writer that appends to an [`EvalBuf`] and records whether a failure was
/// an overflow (retryable) or came from the formatter itself (fatal).
struct BoundedWriter<'a> {
    buf: &'a mut EvalBuf,
    overflowed: bool,
}

impl fmt::Write for BoundedWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.buf.push_bytes(s.as_bytes()).is_err() {
            self.overflowed = true;
            return Err(fmt::Error);
        }
        Ok(())
    }
}

/// Second pass: render calendar escapes with the local time.
///
/// The pass runs once per separator-delimited segment so the format string
/// handed to the formatter is always valid UTF-8; separator bytes are
/// re-inserted verbatim.
fn format_calendar(buf: &mut EvalBuf, now: &DateTime<Local>) -> Result<(), PatternError> {
    let rendered = std::mem::take(&mut buf.data);
    for (index, segment) in rendered.split(|&b| b == ARG_SEPARATOR).enumerate() {
        if index > 0 {
            buf.push(ARG_SEPARATOR)?;
        }
        if !segment.contains(&b'%') {
            buf.push_bytes(segment)?;
            continue;
        }
        let fmt_str = std::str::from_utf8(segment).map_err(|_| PatternError::Format)?;
        let mut writer = BoundedWriter {
            buf: &mut *buf,
            overflowed: false,
        };
        let formatted = now.format_with_items(StrftimeItems::new(fmt_str));
        if write!(writer, "{}", formatted).is_err() {
            return Err(if writer.overflowed {
                PatternError::BufferTooSmall
            } else {
                PatternError::Format
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn vars(path: Option<&str>) -> PatternVars<'_> {
        PatternVars {
            device: 0,
            width: 1920,
            height: 1080,
            path,
        }
    }

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 6, 12, 30, 5).unwrap()
    }

    fn render(pattern: &str, path: Option<&str>) -> Result<Vec<u8>, PatternError> {
        evaluate_at(pattern, &vars(path), fixed_time())
    }

    #[test]
    fn width_and_height_substitution() {
        assert_eq!(render("$w x $h", None).unwrap(), b"1920 x 1080");
    }

    #[test]
    fn pixel_count_substitution() {
        assert_eq!(render("$p", None).unwrap(), b"2073600");
    }

    #[test]
    fn device_index_and_literal_dollar() {
        let v = PatternVars {
            device: 3,
            width: 8,
            height: 8,
            path: None,
        };
        assert_eq!(evaluate_at("fb$i$$", &v, fixed_time()).unwrap(), b"fb3$");
    }

    #[test]
    fn path_variables_are_dropped_in_path_mode() {
        assert_eq!(render("pre$fpost", None).unwrap(), b"prepost");
        assert_eq!(render("pre$npost", None).unwrap(), b"prepost");
    }

    #[test]
    fn path_and_basename_substitution() {
        let out = render("$f|$n", Some("/tmp/shots/fb0.png")).unwrap();
        assert_eq!(split_command(&out), vec!["/tmp/shots/fb0.png|fb0.png"]);
        let out = render("$n", Some("plain.png")).unwrap();
        assert_eq!(split_command(&out), vec!["plain.png"]);
    }

    #[test]
    fn percents_in_substituted_paths_survive_the_calendar_pass() {
        let out = render("$f", Some("a%b.png")).unwrap();
        assert_eq!(split_command(&out), vec!["a%b.png"]);
    }

    #[test]
    fn unknown_variable_is_an_error() {
        assert_eq!(render("$z", None), Err(PatternError::UnknownVariable('z')));
    }

    #[test]
    fn backslash_escapes() {
        assert_eq!(render(r"a\nb", None).unwrap(), b"a\nb");
        assert_eq!(render(r"a\\b", None).unwrap(), b"a\\b");
        assert_eq!(render(r"a\xb", None).unwrap(), b"axb");
    }

    #[test]
    fn command_mode_splits_on_unescaped_spaces() {
        let out = render("echo a b", Some("x.png")).unwrap();
        assert_eq!(split_command(&out), vec!["echo", "a", "b"]);
    }

    #[test]
    fn escaped_space_stays_inside_one_argument() {
        let out = render(r"echo a\ b", Some("x.png")).unwrap();
        assert_eq!(split_command(&out), vec!["echo", "a b"]);
    }

    #[test]
    fn consecutive_separators_keep_empty_arguments() {
        let out = render(" a  b", Some("x.png")).unwrap();
        assert_eq!(split_command(&out), vec!["", "a", "", "b"]);
    }

    #[test]
    fn spaces_stay_literal_in_path_mode() {
        assert_eq!(render("a b", None).unwrap(), b"a b");
    }

    #[test]
    fn calendar_fields_are_expanded() {
        assert_eq!(render("%Y-%m-%d", None).unwrap(), b"2026-08-06");
        assert_eq!(render("shot_%H:%M:%S", None).unwrap(), b"shot_12:30:05");
    }

    #[test]
    fn doubled_percent_renders_one_literal_percent() {
        assert_eq!(render("a%%b", None).unwrap(), b"a%b");
    }

    #[test]
    fn calendar_escapes_expand_inside_command_arguments() {
        let out = render("touch shot-%Y.png", Some("x.png")).unwrap();
        assert_eq!(split_command(&out), vec!["touch", "shot-2026.png"]);
    }

    #[test]
    fn long_patterns_grow_the_buffer() {
        let pattern = "x".repeat(500);
        assert_eq!(render(&pattern, None).unwrap(), pattern.as_bytes());
    }

    #[test]
    fn evaluation_is_idempotent_for_a_fixed_time() {
        let pattern = "%Y-%m-%d_$wx$h.$i.png";
        assert_eq!(render(pattern, None).unwrap(), render(pattern, None).unwrap());
    }

    #[test]
    fn duplicate_percents_doubles_each_percent() {
        let mut buf = EvalBuf::with_capacity(16);
        buf.push_bytes(b"a%b%%c").unwrap();
        duplicate_percents(&mut buf, 0).unwrap();
        assert_eq!(buf.data, b"a%%b%%%%c");
    }

    #[test]
    fn duplicate_percents_reports_overflow() {
        // "a%b%%c" needs 6 + 3 bytes once doubled.
        let mut buf = EvalBuf::with_capacity(8);
        buf.push_bytes(b"a%b%%c").unwrap();
        assert_eq!(
            duplicate_percents(&mut buf, 0),
            Err(PatternError::BufferTooSmall)
        );
        let mut buf = EvalBuf::with_capacity(9);
        buf.push_bytes(b"a%b%%c").unwrap();
        assert!(duplicate_percents(&mut buf, 0).is_ok());
    }

    #[test]
    fn overflow_from_substitution_retries_until_it_fits() {
        // A path far beyond the initial capacity forces several retries.
        let long_path = format!("/tmp/{}.png", "d".repeat(200));
        let out = render("$f", Some(&long_path)).unwrap();
        assert_eq!(split_command(&out), vec![long_path]);
    }
}
