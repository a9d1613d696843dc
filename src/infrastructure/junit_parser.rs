// JUnit XML report parser
use crate::application::artifact_source::ReportParser;
use crate::domain::test_report::{TestCase, TestFailure, TestSuite};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Accepts a `<testsuites>` wrapper or a bare `<testsuite>` root. Elements and attributes it
/// does not know are skipped; suites nested inside a suite are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct JunitXmlParser;

impl ReportParser for JunitXmlParser {
    fn parse(&self, text: &str) -> Vec<TestSuite> {
        match parse_suites(text) {
            Ok(suites) => suites,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse test report");
                Vec::new()
            }
        }
    }
}

fn parse_suites(text: &str) -> quick_xml::Result<Vec<TestSuite>> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut suites = Vec::new();
    let mut suite: Option<TestSuite> = None;
    let mut case: Option<TestCase> = None;
    let mut failure: Option<TestFailure> = None;
    let mut nested_suites = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"testsuite" if suite.is_none() => suite = Some(read_suite(&e)),
                b"testsuite" => nested_suites += 1,
                b"testcase" if suite.is_some() && nested_suites == 0 => case = Some(read_case(&e)),
                b"failure" if case.is_some() => failure = Some(read_failure(&e)),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"testsuite" if suite.is_none() => suites.push(read_suite(&e)),
                b"testcase" if nested_suites == 0 => {
                    if let Some(open) = suite.as_mut() {
                        open.testcases.push(read_case(&e));
                    }
                }
                b"failure" => {
                    if let Some(open) = case.as_mut() {
                        open.failure = Some(read_failure(&e));
                    }
                }
                _ => {}
            },
            Event::Text(t) => {
                if let Some(open) = failure.as_mut() {
                    open.content.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(open) = failure.as_mut() {
                    open.content.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"testsuite" if nested_suites > 0 => nested_suites -= 1,
                b"testsuite" => suites.extend(suite.take()),
                b"testcase" => {
                    if let (Some(done), Some(open)) = (case.take(), suite.as_mut()) {
                        open.testcases.push(done);
                    }
                }
                b"failure" => {
                    if let (Some(done), Some(open)) = (failure.take(), case.as_mut()) {
                        open.failure = Some(done);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(suites)
}

fn read_suite(element: &BytesStart) -> TestSuite {
    let mut suite = TestSuite::default();
    for (key, value) in attributes(element) {
        match key.as_slice() {
            b"name" => suite.name = value,
            b"tests" => suite.tests_count = parse_count(&value),
            b"failures" => suite.failures = parse_count(&value),
            b"errors" => suite.errors = parse_count(&value),
            b"skipped" => suite.skipped = parse_count(&value),
            b"time" => suite.time_seconds = parse_seconds(&value),
            _ => {}
        }
    }
    suite
}

fn read_case(element: &BytesStart) -> TestCase {
    let mut case = TestCase::default();
    for (key, value) in attributes(element) {
        match key.as_slice() {
            b"name" => case.name = value,
            b"classname" => case.class_name = value,
            b"time" => case.time_seconds = parse_seconds(&value),
            _ => {}
        }
    }
    case
}

fn read_failure(element: &BytesStart) -> TestFailure {
    let mut failure = TestFailure::default();
    for (key, value) in attributes(element) {
        if key == b"message" {
            failure.message = value;
        }
    }
    failure
}

fn attributes(element: &BytesStart) -> Vec<(Vec<u8>, String)> {
    element
        .attributes()
        .flatten()
        .map(|attr| {
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_default();
            (attr.key.local_name().as_ref().to_vec(), value)
        })
        .collect()
}

fn parse_count(value: &str) -> u32 {
    value.trim().parse().unwrap_or(0)
}

// Some reporters write "1,234.5"
fn parse_seconds(value: &str) -> f64 {
    value.trim().replace(',', "").parse().unwrap_or(0.0)
}
