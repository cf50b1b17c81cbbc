#![allow(dead_code)]

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};

use pretty_assertions::assert_eq;

pub fn compare_results<R, E>(result: R, mut expected: E, expected_file: &str)
where
    R: BufRead,
    E: BufRead,
{
    let mut buf = String::new();
    let mut line_num = 1;
    for line in result.lines() {
        let line = line.unwrap();
        if expected.read_line(&mut buf).unwrap() == 0 {
            panic!(
                "\noutput has more lines than expected result file: {}",
                expected_file
            );
        }
        assert_eq!(
            line.trim_end(),
            buf.trim_end(),
            "\n{}:{}",
            expected_file,
            line_num
        );
        buf.clear();
        line_num += 1;
    }

    if expected.read_line(&mut buf).unwrap() > 0 {
        panic!(
            "\n{} has more lines than output, beginning at line: {}",
            expected_file, line_num
        )
    }
}

pub fn compare_with_file(output: Vec<u8>, expected_file: &str) {
    let expected = BufReader::new(File::open(expected_file).unwrap());
    compare_results(Cursor::new(output), expected, expected_file);
}
