use super::commands::is_comment;
use super::compile_line;
use super::types::CompiledLine;
use crate::error::LoadError;
use std::collections::{BTreeMap, HashMap};

/// One numbered program line with its location in the source text.
#[derive(Debug, Clone)]
pub struct SourceLine {
    pub number: u32,
    pub text: String,
    /// Character offset of the line's first non-blank character.
    pub start: usize,
    /// Length of the line in characters.
    pub len: usize,
    pub compiled: CompiledLine,
}

/// A whole program, sorted by line number.
#[derive(Debug, Clone)]
pub struct Program {
    lines: Vec<SourceLine>,
    index: HashMap<u32, usize>,
}

fn leading_number(text: &str) -> Option<u32> {
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

impl Program {
    /// Compiles every line of `source`. Blank and comment-only lines without
    /// a number are skipped; a line number given twice keeps the last line.
    pub fn parse(source: &str) -> Result<Self, LoadError> {
        let mut numbered = BTreeMap::new();
        let mut offset = 0usize;

        for (physical, raw) in source.split_inclusive('\n').enumerate() {
            let line_offset = offset;
            offset += raw.chars().count();

            let text = raw.trim_end_matches(['\r', '\n']);
            let leading = text.chars().take_while(|c| c.is_whitespace()).count();
            let text = text.trim();
            if text.is_empty() {
                continue;
            }

            let Some(number) = leading_number(text) else {
                if is_comment(text) {
                    continue;
                }
                return Err(LoadError::MissingLineNumber {
                    physical: physical + 1,
                });
            };
            let compiled = compile_line(text).map_err(|source| LoadError::Compile {
                line: number,
                source,
            })?;

            numbered.insert(
                number,
                SourceLine {
                    number,
                    text: text.to_string(),
                    start: line_offset + leading,
                    len: text.chars().count(),
                    compiled,
                },
            );
        }

        if numbered.is_empty() {
            return Err(LoadError::Empty);
        }

        let lines: Vec<SourceLine> = numbered.into_values().collect();
        let index = lines
            .iter()
            .enumerate()
            .map(|(i, line)| (line.number, i))
            .collect();
        Ok(Self { lines, index })
    }

    pub fn lines(&self) -> &[SourceLine] {
        &self.lines
    }

    pub fn get(&self, index: usize) -> Option<&SourceLine> {
        self.lines.get(index)
    }

    pub fn index_of(&self, number: u32) -> Option<usize> {
        self.index.get(&number).copied()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line number → `(start, length)` in characters, for highlighting.
    pub fn source_map(&self) -> HashMap<String, (usize, usize)> {
        self.lines
            .iter()
            .map(|line| (line.number.to_string(), (line.start, line.len)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_lines_and_maps_offsets() {
        let program = Program::parse("20 print 2\n10 a=1\n").unwrap();
        let numbers: Vec<u32> = program.lines().iter().map(|l| l.number).collect();
        assert_eq!(numbers, vec![10, 20]);

        let map = program.source_map();
        assert_eq!(map["20"], (0, 10));
        assert_eq!(map["10"], (11, 6));
    }

    #[test]
    fn reports_missing_line_numbers() {
        let err = Program::parse("10 a=1\nprint a\n").unwrap_err();
        assert_eq!(err, LoadError::MissingLineNumber { physical: 2 });
    }

    #[test]
    fn reports_compile_errors_with_line() {
        let err = Program::parse("10 a=1\n20 a=\"x\"\n").unwrap_err();
        assert!(matches!(err, LoadError::Compile { line: 20, .. }));
    }
}
