use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use common::language::language_name;
use dashmap::DashMap;
use judge::{ExecutionRequest, ExecutionResponse, JudgeError, JudgeStatus, StatusInfo};
use tracing::debug;
use uuid::Uuid;

use super::ExecutionBackend;
use crate::health::ServiceMode;

const ACCEPTED: u32 = 3;
const WRONG_ANSWER: u32 = 4;
const TIME_LIMIT_EXCEEDED: u32 = 5;
const COMPILATION_ERROR: u32 = 6;
const RUNTIME_ERROR_NZEC: u32 = 11;

const UNBOUNDED_LOOPS: &[&str] = &["while(true)", "whileTrue:", "for(;;)", "loop{"];
const RAISE_MARKERS: &[&str] = &["throw ", "raise ", "panic!(", "System.exit(1)"];

/// Deterministic local stand-in for a judge.
///
/// Programs are never run. The verdict is derived from the source text, so
/// the same request always yields the same response. Finished jobs are kept
/// until polled once.
#[derive(Debug, Default)]
pub struct SimulatedJudge {
    jobs: DashMap<String, ExecutionResponse>,
    submitted: AtomicU64,
}

impl SimulatedJudge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of programs submitted so far.
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Jobs submitted but not yet polled.
    pub fn pending(&self) -> usize {
        self.jobs.len()
    }
}

#[async_trait]
impl ExecutionBackend for SimulatedJudge {
    fn mode(&self) -> ServiceMode {
        ServiceMode::Simulated
    }

    fn endpoint(&self) -> Option<String> {
        None
    }

    async fn submit(&self, request: &ExecutionRequest) -> judge::Result<String> {
        let token = Uuid::new_v4().to_string();
        let mut response = evaluate(request);
        response.token = token.clone();

        debug!(
            token = %token,
            status = response.status.id,
            "Simulated execution finished"
        );
        self.submitted.fetch_add(1, Ordering::Relaxed);
        self.jobs.insert(token.clone(), response);
        Ok(token)
    }

    async fn poll(&self, token: &str) -> judge::Result<ExecutionResponse> {
        self.jobs
            .remove(token)
            .map(|(_, response)| response)
            .ok_or_else(|| JudgeError::UnknownToken(token.to_string()))
    }

    async fn check_health(&self) -> bool {
        true
    }
}

/// Derive a terminal response from the request alone.
fn evaluate(request: &ExecutionRequest) -> ExecutionResponse {
    let source = request.source_code.as_str();
    let elapsed = simulated_time(source);

    if let Err(problem) = check_delimiters(source, request.language_id) {
        return response(COMPILATION_ERROR, elapsed).with_compile_output(format!(
            "SyntaxError: {problem}"
        ));
    }

    if has_unbounded_loop(source) {
        return response(TIME_LIMIT_EXCEEDED, request.limits.cpu_time_limit);
    }

    if let Some((line_no, line)) = raising_line(source) {
        return response(RUNTIME_ERROR_NZEC, elapsed)
            .with_stderr(format!("Uncaught error at line {line_no}: {line}"));
    }

    match request.expected_output.as_deref() {
        // Harness programs assert on their own.
        None => response(ACCEPTED, elapsed),
        Some(expected) => {
            let expected = expected.trim();
            if source.contains(expected) {
                response(ACCEPTED, elapsed).with_stdout(expected.to_string())
            } else {
                response(WRONG_ANSWER, elapsed).with_stdout(String::new())
            }
        }
    }
}

fn response(status_id: u32, seconds: f64) -> ExecutionResponse {
    ExecutionResponse {
        token: String::new(),
        status: StatusInfo {
            id: status_id,
            description: JudgeStatus::from_id(status_id).description().to_string(),
        },
        stdout: None,
        stderr: None,
        compile_output: None,
        message: None,
        time: Some(seconds),
        memory: Some(2048),
    }
}

trait ResponseExt {
    fn with_stdout(self, stdout: String) -> Self;
    fn with_stderr(self, stderr: String) -> Self;
    fn with_compile_output(self, output: String) -> Self;
}

impl ResponseExt for ExecutionResponse {
    fn with_stdout(mut self, stdout: String) -> Self {
        self.stdout = Some(stdout);
        self
    }

    fn with_stderr(mut self, stderr: String) -> Self {
        self.stderr = Some(stderr);
        self
    }

    fn with_compile_output(mut self, output: String) -> Self {
        self.compile_output = Some(output);
        self
    }
}

/// Seconds. Grows with source size: 5 ms plus 1 ms per 50 bytes.
fn simulated_time(source: &str) -> f64 {
    (5 + source.len() as u64 / 50) as f64 / 1000.0
}

/// Comment and literal forms that hide delimiters from the balance check.
#[derive(Debug, Clone, Copy)]
struct Syntax {
    hash_comments: bool,
    slash_comments: bool,
    triple_quotes: bool,
    lifetimes: bool,
}

impl Syntax {
    fn for_language(language_id: u32) -> Self {
        let name = language_name(language_id);
        let python = name == Some("python");
        Self {
            hash_comments: python,
            slash_comments: !python,
            triple_quotes: python,
            lifetimes: name == Some("rust"),
        }
    }
}

/// Cursor over the source that keeps track of the current line.
struct Scanner<'a> {
    chars: &'a [char],
    pos: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    fn new(chars: &'a [char]) -> Self {
        Self {
            chars,
            pos: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn starts_with(&self, pattern: &str) -> bool {
        pattern
            .chars()
            .enumerate()
            .all(|(k, p)| self.chars.get(self.pos + k) == Some(&p))
    }

    fn bump(&mut self, n: usize) {
        for _ in 0..n {
            let Some(c) = self.peek() else { return };
            if c == '\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
    }

    fn skip_line(&mut self) {
        while self.peek().is_some_and(|c| c != '\n') {
            self.pos += 1;
        }
    }

    /// Consume up to and including `close`; false if the source ends first.
    fn skip_past(&mut self, close: &str, escapes: bool) -> bool {
        while let Some(c) = self.peek() {
            if escapes && c == '\\' {
                self.bump(2);
            } else if self.starts_with(close) {
                self.bump(close.chars().count());
                return true;
            } else {
                self.bump(1);
            }
        }
        false
    }

    /// Consume a single-line literal. An unterminated one ends at the newline.
    fn skip_quoted(&mut self, quote: char) {
        while let Some(c) = self.peek() {
            match c {
                '\n' => return,
                '\\' => self.bump(2),
                c if c == quote => {
                    self.bump(1);
                    return;
                }
                _ => self.bump(1),
            }
        }
    }
}

/// Check that `()[]{}` are balanced outside string literals and comments.
fn check_delimiters(source: &str, language_id: u32) -> Result<(), String> {
    let syntax = Syntax::for_language(language_id);
    let chars: Vec<char> = source.chars().collect();
    let mut scanner = Scanner::new(&chars);
    let mut stack: Vec<(char, usize)> = Vec::new();

    while let Some(c) = scanner.peek() {
        let line_no = scanner.line;

        if (syntax.hash_comments && c == '#')
            || (syntax.slash_comments && scanner.starts_with("//"))
        {
            scanner.skip_line();
            continue;
        }
        if syntax.slash_comments && scanner.starts_with("/*") {
            scanner.bump(2);
            if !scanner.skip_past("*/", false) {
                return Err(format!("unterminated comment opened at line {line_no}"));
            }
            continue;
        }
        if syntax.triple_quotes {
            let delim = ["\"\"\"", "'''"]
                .into_iter()
                .find(|d| scanner.starts_with(d));
            if let Some(delim) = delim {
                scanner.bump(3);
                if !scanner.skip_past(delim, true) {
                    return Err(format!("unterminated string opened at line {line_no}"));
                }
                continue;
            }
        }

        let quote_at = scanner.pos;
        scanner.bump(1);
        match c {
            '`' => {
                if !scanner.skip_past("`", true) {
                    return Err(format!(
                        "unterminated template literal opened at line {line_no}"
                    ));
                }
            }
            '"' => scanner.skip_quoted('"'),
            '\'' if !(syntax.lifetimes && is_lifetime(&chars, quote_at)) => {
                scanner.skip_quoted('\'')
            }
            '(' | '[' | '{' => stack.push((c, line_no)),
            ')' | ']' | '}' => {
                let open = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((top, _)) if top == open => {}
                    _ => return Err(format!("unexpected '{c}' at line {line_no}")),
                }
            }
            _ => {}
        }
    }

    match stack.pop() {
        Some((open, line_no)) => Err(format!("unclosed '{open}' opened at line {line_no}")),
        None => Ok(()),
    }
}

/// `'a` in `&'a str` or `<'a>`.
fn is_lifetime(chars: &[char], quote: usize) -> bool {
    let prev = chars[..quote].iter().rev().find(|c| !c.is_whitespace());
    if !matches!(prev, Some('&' | '<' | ',')) {
        return false;
    }
    let ident_end = chars[quote + 1..]
        .iter()
        .position(|c| !(c.is_alphanumeric() || *c == '_'))
        .map(|p| quote + 1 + p);
    match ident_end {
        Some(end) => end > quote + 1 && chars[end] != '\'',
        None => quote + 1 < chars.len(),
    }
}

fn has_unbounded_loop(source: &str) -> bool {
    let compact: String = source.chars().filter(|c| !c.is_whitespace()).collect();
    UNBOUNDED_LOOPS.iter().any(|p| compact.contains(p)) && !source.contains("break")
}

fn raising_line(source: &str) -> Option<(usize, &str)> {
    source
        .lines()
        .enumerate()
        .find(|(_, line)| RAISE_MARKERS.iter().any(|m| line.contains(m)))
        .map(|(idx, line)| (idx + 1, line.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use judge::ResourceLimits;

    const JAVASCRIPT: u32 = 63;
    const PYTHON: u32 = 71;
    const RUST: u32 = 73;

    fn io_request(source: &str, expected: &str) -> ExecutionRequest {
        ExecutionRequest {
            source_code: source.into(),
            language_id: PYTHON,
            stdin: String::new(),
            expected_output: Some(expected.into()),
            limits: ResourceLimits::default(),
        }
    }

    fn harness_request(source: &str) -> ExecutionRequest {
        ExecutionRequest {
            expected_output: None,
            ..io_request(source, "")
        }
    }

    #[test]
    fn test_output_found_in_source_is_accepted() {
        let response = evaluate(&io_request("print('hello')", "hello\n"));
        assert_eq!(response.status.id, ACCEPTED);
        assert_eq!(response.stdout.as_deref(), Some("hello"));
        assert!(response.time_ms() >= 5);
    }

    #[test]
    fn test_missing_output_is_wrong_answer() {
        let response = evaluate(&io_request("print('bye')", "hello"));
        assert_eq!(response.status.id, WRONG_ANSWER);
        assert_eq!(response.stdout.as_deref(), Some(""));
    }

    #[test]
    fn test_unbalanced_source_is_compilation_error() {
        let response = evaluate(&io_request("function f() {\n  return (1;\n}", "1"));
        assert_eq!(response.status.id, COMPILATION_ERROR);
        let output = response.compile_output.unwrap();
        assert!(output.starts_with("SyntaxError"), "{output}");
        assert!(output.contains("unexpected '}' at line 3"), "{output}");
    }

    #[test]
    fn test_delimiters_in_strings_and_comments_are_ignored() {
        assert!(check_delimiters("console.log(\"(\"); // )", JAVASCRIPT).is_ok());
        assert!(check_delimiters("/* { */ let x = [1];", JAVASCRIPT).is_ok());
        assert!(check_delimiters("print('[')  # ]", PYTHON).is_ok());
        assert!(check_delimiters("let s = `}`;", JAVASCRIPT).is_ok());
        assert!(check_delimiters("let c = '\\'';", JAVASCRIPT).is_ok());
    }

    #[test]
    fn test_hash_is_code_outside_python() {
        let source = "class Counter { #n = 0; inc() { this.#n++; return this.#n; } }\n\
                      console.log(new Counter().inc());";
        assert!(check_delimiters(source, JAVASCRIPT).is_ok());

        let response = evaluate(&ExecutionRequest {
            language_id: JAVASCRIPT,
            ..io_request(source, "1")
        });
        assert_eq!(response.status.id, WRONG_ANSWER);
        assert!(response.compile_output.is_none());
    }

    #[test]
    fn test_double_slash_is_code_in_python() {
        assert!(check_delimiters("print((7 // 2) * [1][0])", PYTHON).is_ok());
        let err = check_delimiters("print(7 // 2", PYTHON).unwrap_err();
        assert_eq!(err, "unclosed '(' opened at line 1");
    }

    #[test]
    fn test_multiline_literals_hide_delimiters() {
        let source =
            "def f():\n    \"\"\"Return 1 (the answer.\n    \"\"\"\n    return 1\nprint(f())";
        assert!(check_delimiters(source, PYTHON).is_ok());
        assert_eq!(evaluate(&io_request(source, "1")).status.id, ACCEPTED);

        assert!(check_delimiters("x = '''[\n{'''\nprint(x)", PYTHON).is_ok());

        let source = "const s = `(\n]`;\nconsole.log(s.length);";
        assert!(check_delimiters(source, JAVASCRIPT).is_ok());
    }

    #[test]
    fn test_unterminated_multiline_literal_is_reported() {
        let err = check_delimiters("x = 1\ns = \"\"\"(\nprint(s)", PYTHON).unwrap_err();
        assert_eq!(err, "unterminated string opened at line 2");

        let err = check_delimiters("const s = `abc;\n", JAVASCRIPT).unwrap_err();
        assert_eq!(err, "unterminated template literal opened at line 1");
    }

    #[test]
    fn test_rust_lifetimes_are_not_literals() {
        let source = "fn first<'a>(x: &'a str, y: &'a str) -> &'a str {\n    x\n}";
        assert!(check_delimiters(source, RUST).is_ok());
        assert!(check_delimiters("let open = '{';", RUST).is_ok());
    }

    #[test]
    fn test_python_strings_after_commas_are_literals() {
        assert!(check_delimiters("xs = [1, 'a b]']", PYTHON).is_ok());
    }

    #[test]
    fn test_unclosed_delimiter_reports_opening_line() {
        let err = check_delimiters("def f():\n    return [1, 2\n", PYTHON).unwrap_err();
        assert_eq!(err, "unclosed '[' opened at line 2");
    }

    #[test]
    fn test_unbounded_loop_times_out() {
        let response = evaluate(&io_request("while (true) {\n  x++;\n}", "1"));
        assert_eq!(response.status.id, TIME_LIMIT_EXCEEDED);
        assert_eq!(response.time_ms(), 2000);

        let response = evaluate(&io_request("while True:\n    pass", "1"));
        assert_eq!(response.status.id, TIME_LIMIT_EXCEEDED);
    }

    #[test]
    fn test_loop_with_break_is_not_a_timeout() {
        let source = "while True:\n    print(1)\n    break";
        assert_eq!(evaluate(&io_request(source, "1")).status.id, ACCEPTED);
    }

    #[test]
    fn test_raise_is_runtime_error() {
        let source = "def solve():\n    raise ValueError('bad')\n";
        let response = evaluate(&io_request(source, "ok"));
        assert_eq!(response.status.id, RUNTIME_ERROR_NZEC);
        assert_eq!(
            response.stderr.as_deref(),
            Some("Uncaught error at line 2: raise ValueError('bad')")
        );
        assert_eq!(response.status.description, "Runtime Error (NZEC)");
    }

    #[test]
    fn test_harness_passes_when_program_is_clean() {
        let response = evaluate(&harness_request("function add(a, b) { return a + b; }"));
        assert_eq!(response.status.id, ACCEPTED);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let request = io_request("print(42)", "42");
        assert_eq!(evaluate(&request), evaluate(&request));
    }

    #[tokio::test]
    async fn test_submit_then_poll_once() {
        let judge = SimulatedJudge::new();
        let token = judge.submit(&io_request("print(42)", "42")).await.unwrap();
        assert_eq!(judge.pending(), 1);

        let response = judge.poll(&token).await.unwrap();
        assert_eq!(response.token, token);
        assert!(response.is_terminal());
        assert_eq!(judge.submitted(), 1);

        let err = judge.poll(&token).await.unwrap_err();
        assert!(matches!(err, JudgeError::UnknownToken(_)));
    }

    #[tokio::test]
    async fn test_always_healthy_without_endpoint() {
        let judge = SimulatedJudge::new();
        assert!(judge.check_health().await);
        assert_eq!(judge.mode(), ServiceMode::Simulated);
        assert!(judge.endpoint().is_none());
        assert!(judge.stats().is_none());
    }

    #[tokio::test]
    async fn test_languages_come_from_the_registry() {
        let languages = SimulatedJudge::new().languages().await.unwrap();
        let python = languages.iter().find(|l| l.name == "python").unwrap();
        assert_eq!(python.id, PYTHON);
        assert_eq!(languages.len(), common::language::languages().count());
    }
}
