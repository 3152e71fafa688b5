//! Command-line tokenization with Win32 process-creation rules
//!
//! The bridge receives the child's invocation as one opaque string. The
//! program name is taken the way `CreateProcess` takes it; the remaining
//! arguments follow the Microsoft C runtime rules so a POSIX host sees the
//! same argv the target runtime would.

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Split off the program name. Returns the name and the untouched remainder.
///
/// A leading `"` runs to the next `"`, with no escapes. Otherwise the name
/// ends at the first blank. `None` when the line names no program.
pub fn split_program(line: &str) -> Option<(String, &str)> {
    let line = line.trim_start_matches(is_blank);

    let (program, rest) = if let Some(quoted) = line.strip_prefix('"') {
        match quoted.find('"') {
            Some(end) => (&quoted[..end], &quoted[end + 1..]),
            None => (quoted, ""),
        }
    } else {
        match line.find(is_blank) {
            Some(end) => (&line[..end], &line[end..]),
            None => (line, ""),
        }
    };

    if program.is_empty() {
        return None;
    }
    Some((program.to_string(), rest.trim_start_matches(is_blank)))
}

/// Split arguments with the C runtime rules.
///
/// * `2n` backslashes then `"`: `n` backslashes, quote toggles.
/// * `2n+1` backslashes then `"`: `n` backslashes and a literal `"`.
/// * Backslashes not followed by `"` are literal.
/// * `""` inside a quoted run is a literal `"`.
pub fn split_arguments(args: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = args.chars().peekable();

    loop {
        while chars.next_if(|c| is_blank(*c)).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut arg = String::new();
        let mut in_quotes = false;

        while let Some(&c) = chars.peek() {
            match c {
                c if is_blank(c) && !in_quotes => break,
                '\\' => {
                    let mut backslashes = 0;
                    while chars.next_if_eq(&'\\').is_some() {
                        backslashes += 1;
                    }
                    if chars.peek() == Some(&'"') {
                        arg.extend(std::iter::repeat('\\').take(backslashes / 2));
                        if backslashes % 2 == 1 {
                            arg.push('"');
                            chars.next();
                        }
                    } else {
                        arg.extend(std::iter::repeat('\\').take(backslashes));
                    }
                }
                '"' => {
                    chars.next();
                    if in_quotes && chars.next_if_eq(&'"').is_some() {
                        arg.push('"');
                    } else {
                        in_quotes = !in_quotes;
                    }
                }
                other => {
                    arg.push(other);
                    chars.next();
                }
            }
        }

        out.push(arg);
    }

    out
}
