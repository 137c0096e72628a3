//! The handful of textual conventions that differ between the two AT&T
//! targets this emitter supports. Everything else about the output is
//! identical.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Linux,
    MacOs,
}

impl Target {
    pub fn host() -> Target {
        if cfg!(target_os = "macos") {
            Target::MacOs
        } else {
            Target::Linux
        }
    }

    pub fn parse(name: &str) -> Option<Target> {
        match name {
            "linux" => Some(Target::Linux),
            "macos" => Some(Target::MacOs),
            _ => None,
        }
    }

    /// External symbol name as it must appear in the assembly text.
    pub fn symbol(self, name: &str) -> String {
        match self {
            Target::Linux => name.to_string(),
            Target::MacOs => format!("_{name}"),
        }
    }

    pub fn data_section(self) -> &'static str {
        match self {
            Target::Linux => ".section .data",
            Target::MacOs => ".section __DATA,__data",
        }
    }

    pub fn text_section(self) -> &'static str {
        match self {
            Target::Linux => ".section .text",
            Target::MacOs => ".section __TEXT,__text",
        }
    }

    pub fn align_directive(self, bytes: u32) -> String {
        match self {
            Target::Linux => format!(".align {bytes}"),
            Target::MacOs => format!(".p2align {}", bytes.trailing_zeros()),
        }
    }

    /// Appended once at the end of the file on Linux; macOS has no
    /// equivalent marker section.
    pub fn trailing_directive(self) -> Option<&'static str> {
        match self {
            Target::Linux => Some(".section .note.GNU-stack,\"\",@progbits"),
            Target::MacOs => None,
        }
    }
}
