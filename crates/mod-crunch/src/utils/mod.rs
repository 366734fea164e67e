use regex::Regex;

pub mod config;

#[macro_export]
macro_rules! println_pad {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        for __line in __s.lines() {
            println!("    {}", __line);
        }
    }};
}

fn visible_len(ansi: &Regex, s: &str) -> usize {
    ansi.replace_all(s, "").chars().count()
}

/// Prints the provided lines inside an ASCII box
pub fn print_ansi_boxed_lines(lines: &[String]) {
    let Ok(ansi) = Regex::new("\x1b\\[[0-9;]*m") else {
        lines.iter().for_each(|line| println_pad!("{}", line));
        return;
    };

    let width = lines
        .iter()
        .map(|s| visible_len(&ansi, s))
        .max()
        .unwrap_or(0);

    let border = "-".repeat(width + 4);
    println_pad!("{}", border);
    for line in lines {
        let pad = width - visible_len(&ansi, line);
        println_pad!("| {}{} |", line, " ".repeat(pad));
    }
    println_pad!("{}", border);
}
