//! Dialog definitions: the data a sequencer interprets.
//!
//! A dialog is an ordered list of [`Step`]s. Each step has a stage, a guard
//! and an [`Action`]; actions are built from [`Exchange`]s, which pair a
//! command template with the prompts that may follow it.

use std::time::Duration;

use super::stage::{Phase, Stage, TransportKind};
use super::template::{Scope, Template};
use crate::error::Result;
use crate::sequencer::DialogContext;
use crate::topology::OsFamily;

/// A command and the prompts that may answer it.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Command template, sent with a trailing newline.
    pub command: Template,

    /// Prompt templates in match-priority order.
    pub prompts: Vec<Template>,

    /// Overrides the session's default timeout.
    pub timeout: Option<Duration>,

    /// Pause after the prompt matched.
    pub settle: Option<Duration>,

    /// Mask the command in logs and history.
    pub hidden: bool,
}

impl Exchange {
    pub fn new<I, P>(command: impl Into<Template>, prompts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Template>,
    {
        Self {
            command: command.into(),
            prompts: prompts.into_iter().map(Into::into).collect(),
            timeout: None,
            settle: None,
            hidden: false,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn settle(mut self, settle: Duration) -> Self {
        self.settle = Some(settle);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    fn check(&self, scope: &dyn Scope) -> Result<()> {
        self.command.render(scope)?;
        for prompt in &self.prompts {
            prompt.render_pattern(scope)?;
        }
        Ok(())
    }
}

/// What a step does.
#[derive(Debug, Clone)]
pub enum Action {
    /// Run exchanges in order.
    Send(Vec<Exchange>),

    /// Send `probe`; if the prompt at index `banner` matched, run `answers`.
    DialogSkip {
        probe: Exchange,
        banner: usize,
        answers: Vec<Exchange>,
    },

    /// Run `exchange`; if its reply matches `question`, answer once with
    /// `answer`. A second `question` in the answer's reply is an error.
    Confirm {
        exchange: Exchange,
        question: Template,
        answer: Exchange,
        confirm_stage: Option<Stage>,
    },

    /// Run `trigger`, press `key` `presses` times `interval` apart, then
    /// wait for `done`.
    Page {
        trigger: Exchange,
        key: &'static [u8],
        presses: usize,
        interval: Duration,
        done: Template,
    },

    /// Run `head` once, `body` for each item of `collection`, then `tail`.
    ForEach {
        collection: &'static str,
        head: Vec<Exchange>,
        body: Vec<Exchange>,
        tail: Vec<Exchange>,
    },
}

/// Guard deciding whether a step runs.
#[derive(Debug, Clone)]
pub enum Condition {
    Always,
    /// Variable bound and non-empty.
    Present(&'static str),
    /// Variable unbound or empty.
    Absent(&'static str),
    /// Variable equals a value.
    Equals(&'static str, &'static str),
    /// Collection has items.
    NonEmpty(&'static str),
    /// Collection has no items.
    Empty(&'static str),
    All(Vec<Condition>),
}

impl Condition {
    pub fn holds(&self, ctx: &DialogContext) -> bool {
        match self {
            Condition::Always => true,
            Condition::Present(name) => ctx.var(name).is_some_and(|v| !v.is_empty()),
            Condition::Absent(name) => !ctx.var(name).is_some_and(|v| !v.is_empty()),
            Condition::Equals(name, value) => ctx.var(name) == Some(*value),
            Condition::NonEmpty(name) => !ctx.collection(name).is_empty(),
            Condition::Empty(name) => ctx.collection(name).is_empty(),
            Condition::All(all) => all.iter().all(|c| c.holds(ctx)),
        }
    }
}

/// One stage of a dialog.
#[derive(Debug, Clone)]
pub struct Step {
    pub stage: Stage,
    pub when: Condition,
    pub action: Action,
}

impl Step {
    pub fn new(stage: Stage, action: Action) -> Self {
        Self {
            stage,
            when: Condition::Always,
            action,
        }
    }

    /// Shorthand for a linear step.
    pub fn send(stage: Stage, exchanges: Vec<Exchange>) -> Self {
        Self::new(stage, Action::Send(exchanges))
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.when = condition;
        self
    }
}

/// A complete dialog for one OS family and phase.
#[derive(Debug, Clone)]
pub struct DialogDefinition {
    pub name: String,
    pub os: OsFamily,
    pub phase: Phase,
    pub transport: TransportKind,
    /// Send the persist command when the session closes.
    pub persist_on_close: bool,
    pub steps: Vec<Step>,
}

impl DialogDefinition {
    pub fn new(name: impl Into<String>, os: OsFamily, phase: Phase, transport: TransportKind) -> Self {
        Self {
            name: name.into(),
            os,
            phase,
            transport,
            persist_on_close: transport == TransportKind::Shell,
            steps: Vec::new(),
        }
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_persist_on_close(mut self, persist: bool) -> Self {
        self.persist_on_close = persist;
        self
    }

    /// Render every template of every step whose guard holds, so missing
    /// data surfaces before a session is opened.
    pub fn check(&self, ctx: &DialogContext) -> Result<()> {
        let scope = ctx.scope();
        for step in self.steps.iter().filter(|s| s.when.holds(ctx)) {
            match &step.action {
                Action::Send(exchanges) => {
                    for e in exchanges {
                        e.check(&scope)?;
                    }
                }
                Action::DialogSkip { probe, answers, .. } => {
                    probe.check(&scope)?;
                    for e in answers {
                        e.check(&scope)?;
                    }
                }
                Action::Confirm {
                    exchange,
                    question,
                    answer,
                    ..
                } => {
                    exchange.check(&scope)?;
                    question.render_pattern(&scope)?;
                    answer.check(&scope)?;
                }
                Action::Page { trigger, done, .. } => {
                    trigger.check(&scope)?;
                    done.render_pattern(&scope)?;
                }
                Action::ForEach {
                    collection,
                    head,
                    body,
                    tail,
                } => {
                    for e in head.iter().chain(tail) {
                        e.check(&scope)?;
                    }
                    for item in ctx.collection(collection) {
                        let scope = ctx.scope_with(item);
                        for e in body {
                            e.check(&scope)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
