//! Method boundaries and register usage in smali text

/// One method of a smali file, located by line indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBody {
    /// Line of the `.method` header
    pub header: usize,
    /// Line of the matching `.end method`, or the line count if unterminated
    pub end: usize,
    /// Declared `.locals` count, when the line after the header declares one
    pub locals: Option<u32>,
    /// Method name and prototype (`onCreate(Landroid/os/Bundle;)V`)
    pub signature: String,
    pub is_static: bool,
}

impl MethodBody {
    /// Every method in `lines`, in file order
    pub fn scan<S: AsRef<str>>(lines: &[S]) -> Vec<MethodBody> {
        let mut methods = Vec::new();
        let mut index = 0;

        while index < lines.len() {
            let line = lines[index].as_ref().trim();
            if let Some(rest) = line.strip_prefix(".method ") {
                let end = lines[index + 1..]
                    .iter()
                    .position(|l| l.as_ref().trim() == ".end method")
                    .map_or(lines.len(), |offset| index + 1 + offset);
                let locals = lines
                    .get(index + 1)
                    .and_then(|next| parse_locals(next.as_ref()));

                let mut words = rest.split_whitespace();
                methods.push(MethodBody {
                    header: index,
                    end,
                    locals,
                    is_static: words.clone().any(|word| word == "static"),
                    signature: words.next_back().unwrap_or_default().to_string(),
                });
                index = end;
            }
            index += 1;
        }

        methods
    }

    /// Method name without the prototype
    pub fn name(&self) -> &str {
        self.signature
            .split_once('(')
            .map_or(self.signature.as_str(), |(name, _)| name)
    }

    /// Registers the parameters occupy after the locals (`p0`, `p1`, ...)
    ///
    /// Includes `this` for instance methods; `long` and `double` take two.
    pub fn parameter_registers(&self) -> u32 {
        let params = self
            .signature
            .split_once('(')
            .and_then(|(_, rest)| rest.split_once(')'))
            .map_or("", |(params, _)| params);

        let mut count = u32::from(!self.is_static);
        let mut chars = params.chars();
        while let Some(first) = chars.next() {
            let mut kind = first;
            let mut is_array = false;
            while kind == '[' {
                is_array = true;
                kind = chars.next().unwrap_or('V');
            }
            if kind == 'L' {
                let _ = chars.by_ref().find(|&t| t == ';');
            }
            count += if !is_array && matches!(kind, 'J' | 'D') { 2 } else { 1 };
        }
        count
    }

    /// Highest `vN` register referenced between the header and `.end method`
    pub fn highest_register<S: AsRef<str>>(&self, lines: &[S]) -> Option<u32> {
        let end = self.end.min(lines.len());
        lines
            .get(self.header + 1..end)?
            .iter()
            .filter_map(|line| highest_register_in_line(line.as_ref()))
            .max()
    }
}

/// Parse a `.locals N` directive
pub fn parse_locals(line: &str) -> Option<u32> {
    line.trim().strip_prefix(".locals")?.trim().parse().ok()
}

/// Highest `vN` register on one line, ignoring comments and string literals
fn highest_register_in_line(line: &str) -> Option<u32> {
    let code = line.trim_start();
    if code.starts_with('#') {
        return None;
    }

    let bytes = code.as_bytes();
    let mut highest = None;
    let mut in_string = false;
    let mut prev: u8 = b' ';
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if in_string {
            if c == b'\\' {
                i += 1;
            } else if c == b'"' {
                in_string = false;
            }
        } else if c == b'"' {
            in_string = true;
        } else if c == b'#' {
            break;
        } else if c == b'v' && !is_identifier_byte(prev) {
            let digits = bytes[i + 1..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
            let after = bytes.get(i + 1 + digits).copied().unwrap_or(b' ');
            if digits > 0 && !is_identifier_byte(after) {
                if let Ok(register) = code[i + 1..i + 1 + digits].parse::<u32>() {
                    highest = highest.max(Some(register));
                }
                i += digits;
            }
        }
        prev = c;
        i += 1;
    }

    highest
}

fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'/' | b';' | b'-' | b'>')
}
