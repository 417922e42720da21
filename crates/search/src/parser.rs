//! Parsing of `path:line:content` search-tool output.

/// One line of search-tool output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit<'a> {
    pub path: &'a str,
    pub line: u32,
    pub content: &'a str,
}

/// Parses `<path>:<line>:<content>`.
///
/// The path ends at the first `:` followed by digits and another `:`, so a
/// Windows drive prefix (`C:\`) or a colon inside a file name does not cut
/// it short. Returns `None` for malformed lines.
pub fn parse_line(line: &str) -> Option<Hit<'_>> {
    let line = line.trim_end_matches(['\r', '\n']);
    let bytes = line.as_bytes();

    let start = if bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
    {
        2
    } else {
        0
    };

    let mut from = start;
    while let Some(rel) = line[from..].find(':') {
        let colon = from + rel;
        let rest = &line[colon + 1..];
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 && rest.as_bytes().get(digits) == Some(&b':') {
            let path = &line[..colon];
            if path.is_empty() {
                return None;
            }
            let number = rest[..digits].parse::<u32>().ok()?;
            return Some(Hit {
                path,
                line: number,
                content: &rest[digits + 1..],
            });
        }
        from = colon + 1;
    }

    None
}

/// Parses every well-formed line, skipping the rest.
pub fn parse_output(output: &str) -> impl Iterator<Item = Hit<'_>> {
    output.lines().filter_map(parse_line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grep_line() {
        let hit = parse_line("/root/Assets/foo.prefab:42:  m_Value: {fileID: 123}").unwrap();
        assert_eq!(hit.path, "/root/Assets/foo.prefab");
        assert_eq!(hit.line, 42);
        assert_eq!(hit.content, "  m_Value: {fileID: 123}");
    }

    #[test]
    fn parses_findstr_line_with_drive_letter() {
        let hit = parse_line("C:\\proj\\Assets\\a.unity:7:  guid: abc\r").unwrap();
        assert_eq!(hit.path, "C:\\proj\\Assets\\a.unity");
        assert_eq!(hit.line, 7);
        assert_eq!(hit.content, "  guid: abc");
    }

    #[test]
    fn colon_inside_file_name_is_kept() {
        let hit = parse_line("/p/Assets/a:b.asset:3:x").unwrap();
        assert_eq!(hit.path, "/p/Assets/a:b.asset");
        assert_eq!(hit.line, 3);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        assert!(parse_line("/root/Assets/foo.prefab").is_none());
        assert!(parse_line("/root/Assets/foo.prefab:42").is_none());
        assert!(parse_line("/root/Assets/foo.prefab:abc:x").is_none());
        assert!(parse_line(":12:x").is_none());
        assert!(parse_line("").is_none());
    }

    #[test]
    fn parse_output_skips_bad_lines() {
        let out = "a.prefab:1:x\ngarbage\r\nb.prefab:2:y\r\n";
        let paths: Vec<_> = parse_output(out).map(|h| h.path).collect();
        assert_eq!(paths, vec!["a.prefab", "b.prefab"]);
    }
}
