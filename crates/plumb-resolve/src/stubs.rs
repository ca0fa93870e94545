// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Declarations of the standard packages the checker knows without a
//! source tree. They are written in the same language as user code and
//! declare functions without bodies.

/// Import path and source of each built-in package.
const STUBS: &[(&str, &str)] = &[
    ("context", include_str!("../stubs/context.go")),
    ("errors", include_str!("../stubs/errors.go")),
    ("flag", include_str!("../stubs/flag.go")),
    ("fmt", include_str!("../stubs/fmt.go")),
    ("io", include_str!("../stubs/io.go")),
    ("log", include_str!("../stubs/log.go")),
    ("net", include_str!("../stubs/net.go")),
    ("net/http", include_str!("../stubs/net_http.go")),
    ("os", include_str!("../stubs/os.go")),
    ("strings", include_str!("../stubs/strings.go")),
    ("sync", include_str!("../stubs/sync.go")),
    ("testing", include_str!("../stubs/testing.go")),
    ("time", include_str!("../stubs/time.go")),
];

/// Prefix of the virtual file paths given to built-in packages.
pub const STUB_ROOT: &str = "<builtin>";

pub fn lookup(path: &str) -> Option<&'static str> {
    STUBS.iter().find(|(p, _)| *p == path).map(|(_, src)| *src)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_stub_parses() {
        for (path, source) in STUBS {
            let result = plumb_parser::parse_source(source, 0)
                .unwrap_or_else(|errs| panic!("lex errors in {}: {:?}", path, errs));
            assert!(result.is_ok(), "parse errors in {}: {:?}", path, result.errors);
        }
    }

    #[test]
    fn context_stub_declares_todo() {
        let result = plumb_parser::parse_source(lookup("context").unwrap(), 0).unwrap();
        let file = result.file.unwrap();
        assert!(file.funcs().any(|(_, f)| f.name.name == "TODO" && f.body.is_none()));
    }
}
