use std::io::{BufRead, Write};

use anyhow::Context;
use chrono::NaiveDate;

use crate::models::{DateRange, EvalJudgment, SessionRating, StudentTold};

const INPUT_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    Input,
    Choice(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub message: String,
    pub kind: QuestionKind,
    pub default: Option<String>,
}

impl Question {
    pub fn input(message: impl Into<String>, default: Option<String>) -> Self {
        Question {
            message: message.into(),
            kind: QuestionKind::Input,
            default,
        }
    }

    pub fn choice(message: impl Into<String>, choices: &[&str], default: &str) -> Self {
        Question {
            message: message.into(),
            kind: QuestionKind::Choice(choices.iter().map(|c| c.to_string()).collect()),
            default: Some(default.to_string()),
        }
    }
}

/// Operator channel. `ask` returns the raw answer, with the default already
/// applied to an empty reply.
pub trait Prompt {
    fn ask(&mut self, question: &Question) -> anyhow::Result<String>;

    /// Tell the operator why an answer was rejected.
    fn reject(&mut self, reason: &str);
}

/// Line-based prompt on stdin/stdout.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        TerminalPrompt::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        TerminalPrompt { input, output }
    }
}

impl<R: BufRead, W: Write> Prompt for TerminalPrompt<R, W> {
    fn ask(&mut self, question: &Question) -> anyhow::Result<String> {
        write!(self.output, "? {}", question.message)?;
        if let QuestionKind::Choice(choices) = &question.kind {
            write!(self.output, " [{}]", choices.join("/"))?;
        }
        if let Some(default) = &question.default {
            write!(self.output, " ({default})")?;
        }
        write!(self.output, " ")?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read operator input")?;
        if read == 0 {
            anyhow::bail!("operator input closed");
        }

        let answer = line.trim();
        if answer.is_empty() {
            if let Some(default) = &question.default {
                return Ok(default.clone());
            }
        }
        Ok(answer.to_string())
    }

    fn reject(&mut self, reason: &str) {
        let _ = writeln!(self.output, ">> {reason}");
    }
}

/// Ask until `validate` accepts the answer. Choice questions first require
/// one of the listed choices (case-insensitive).
pub fn ask_valid<T, P: Prompt + ?Sized>(
    prompt: &mut P,
    question: &Question,
    validate: impl Fn(&str) -> Result<T, String>,
) -> anyhow::Result<T> {
    loop {
        let mut answer = prompt.ask(question)?;

        if let QuestionKind::Choice(choices) = &question.kind {
            match choices.iter().find(|c| c.eq_ignore_ascii_case(answer.trim())) {
                Some(choice) => answer = choice.clone(),
                None => {
                    prompt.reject(&format!("Please choose one of: {}", choices.join(", ")));
                    continue;
                }
            }
        }

        match validate(&answer) {
            Ok(value) => return Ok(value),
            Err(reason) => prompt.reject(&reason),
        }
    }
}

fn parse_input_date(answer: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(answer.trim(), INPUT_DATE_FORMAT)
        .map_err(|_| "Please enter a valid date (YYYY-MM-DD)".to_string())
}

/// Ask for an inclusive session range, re-asking until it is valid.
pub fn prompt_date_range<P: Prompt + ?Sized>(
    prompt: &mut P,
    default: NaiveDate,
) -> anyhow::Result<DateRange> {
    let default = default.format(INPUT_DATE_FORMAT).to_string();

    let start = ask_valid(
        prompt,
        &Question::input("Start date (YYYY-MM-DD):", Some(default.clone())),
        parse_input_date,
    )?;
    ask_valid(
        prompt,
        &Question::input("End date (YYYY-MM-DD):", Some(default)),
        |answer| {
            let end = parse_input_date(answer)?;
            DateRange::new(start, end)
                .map_err(|_| "End date must not be before start date".to_string())
        },
    )
}

pub fn prompt_judgment<P: Prompt + ?Sized>(
    prompt: &mut P,
    student_name: &str,
) -> anyhow::Result<EvalJudgment> {
    let student_told = ask_valid(
        prompt,
        &Question::choice(
            format!("Did you tell the student ({student_name}) to fill out the eval form?"),
            &["yes", "email"],
            "email",
        ),
        |answer| match answer {
            "yes" => Ok(StudentTold::Yes),
            _ => Ok(StudentTold::Emailed),
        },
    )?;

    let rating = ask_valid(
        prompt,
        &Question::choice(
            format!("How would you rate your session with {student_name}?"),
            &["1", "2", "3", "4", "5", "No Show"],
            "5",
        ),
        |answer| match answer.parse::<u8>() {
            Ok(score) => Ok(SessionRating::Score(score)),
            Err(_) => Ok(SessionRating::NoShow),
        },
    )?;

    Ok(EvalJudgment {
        student_told: Some(student_told),
        rating,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use super::*;

    /// Replays canned answers and records every question and rejection.
    #[derive(Default)]
    pub struct ScriptedPrompt {
        pub answers: VecDeque<String>,
        pub asked: Vec<String>,
        pub rejections: Vec<String>,
    }

    impl ScriptedPrompt {
        pub fn new(answers: &[&str]) -> Self {
            ScriptedPrompt {
                answers: answers.iter().map(|a| a.to_string()).collect(),
                ..ScriptedPrompt::default()
            }
        }
    }

    impl Prompt for ScriptedPrompt {
        fn ask(&mut self, question: &Question) -> anyhow::Result<String> {
            self.asked.push(question.message.clone());
            let answer = self
                .answers
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("no scripted answer for {}", question.message))?;
            match (answer.is_empty(), &question.default) {
                (true, Some(default)) => Ok(default.clone()),
                _ => Ok(answer),
            }
        }

        fn reject(&mut self, reason: &str) {
            self.rejections.push(reason.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedPrompt;
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_range_reprompts_until_valid() {
        let mut prompt = ScriptedPrompt::new(&[
            "11/27/2022",
            "2022-11-26",
            "2022-11-25",
            "2022-11-27",
        ]);
        let range = prompt_date_range(&mut prompt, day(2022, 11, 27)).unwrap();
        assert_eq!(range.start(), day(2022, 11, 26));
        assert_eq!(range.end(), day(2022, 11, 27));
        assert_eq!(prompt.asked.len(), 4);
        assert_eq!(prompt.rejections.len(), 2);
    }

    #[test]
    fn empty_answers_take_defaults() {
        let mut prompt = ScriptedPrompt::new(&["", ""]);
        let range = prompt_date_range(&mut prompt, day(2022, 11, 27)).unwrap();
        assert_eq!(range, DateRange::single(day(2022, 11, 27)));
    }

    #[test]
    fn judgment_choices_are_validated() {
        let mut prompt = ScriptedPrompt::new(&["maybe", "YES", "7", "no show"]);
        let judgment = prompt_judgment(&mut prompt, "Ada Lovelace").unwrap();
        assert_eq!(judgment.student_told, Some(StudentTold::Yes));
        assert_eq!(judgment.rating, SessionRating::NoShow);
        assert_eq!(prompt.rejections.len(), 2);
        assert!(prompt.asked[0].contains("Ada Lovelace"));
    }

    #[test]
    fn judgment_defaults_to_emailed_and_five() {
        let mut prompt = ScriptedPrompt::new(&["", ""]);
        let judgment = prompt_judgment(&mut prompt, "Ada").unwrap();
        assert_eq!(judgment.student_told, Some(StudentTold::Emailed));
        assert_eq!(judgment.rating, SessionRating::Score(5));
    }

    #[test]
    fn terminal_prompt_reads_lines_and_applies_default() {
        let input = b"\n2022-11-30\n".as_slice();
        let mut output = Vec::new();
        let mut prompt = TerminalPrompt::new(input, &mut output);
        let question = Question::input("Start date (YYYY-MM-DD):", Some("2022-11-27".to_string()));
        assert_eq!(prompt.ask(&question).unwrap(), "2022-11-27");
        assert_eq!(prompt.ask(&question).unwrap(), "2022-11-30");
        assert!(prompt.ask(&question).is_err());
        drop(prompt);
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("? Start date (YYYY-MM-DD): (2022-11-27)"));
    }
}
