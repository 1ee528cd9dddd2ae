// vim: set ai et ts=4 sw=4 sts=4:
use std::fmt;
use std::os::unix::io::AsRawFd;
use ansi_term::ANSIString;

pub fn maybe_color(s: &ANSIString, emit_color: bool) -> String {
    match emit_color {
        true  => s.to_string(),
        false => (**s).to_string(), // deref once to get ANSIString, once more to get underlying str
    }
}
pub fn ralign(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        return String::from(s);
    }
    format!("{}{}", " ".repeat(width-len), s)
}
pub fn lalign(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        return String::from(s);
    }
    format!("{}{}", s, " ".repeat(width-len))
}

#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum Direction {
    Horizontal,
    Vertical,
}
impl Direction {
    pub fn line_name(&self) -> &'static str {
        match self {
            Direction::Horizontal => "row",
            Direction::Vertical   => "col",
        }
    }
}
impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.line_name())
    }
}

pub fn is_a_tty<T: AsRawFd>(handle: T) -> bool {
    let fd = handle.as_raw_fd();
    unsafe { libc::isatty(fd) != 0 }
}

/// Raises the nice value of the calling thread. Best effort; returns whether it was applied.
#[cfg(target_os = "linux")]
pub fn lower_thread_priority(niceness: i32) -> bool {
    // on linux, PRIO_PROCESS with who=0 targets the calling thread only
    unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, niceness) == 0 }
}
#[cfg(not(target_os = "linux"))]
pub fn lower_thread_priority(_niceness: i32) -> bool {
    false
}
