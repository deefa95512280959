//! Completion host and calltips.
//!
//! Candidates come from an external [`CandidateEngine`]. The host owns one
//! engine at a time and rebuilds it when the build configuration moves to a
//! new generation; requests are serialised on a mutex.

use std::fmt;

use parking_lot::Mutex;

use crate::base::{LineIndex, TextSize};
use crate::project::{BuildContext, Versioned};
use crate::syntax::ast::{Expr, ExprKind, Ident};
use crate::syntax::{self, visit};

/// One completion candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct Candidate {
    pub name: String,
    /// Rendered type, e.g. `func(s string) int`.
    pub ty: String,
    /// Candidate class, e.g. `func`, `var` or `package`.
    pub class: String,
}

/// Source of completion candidates.
pub trait CandidateEngine: Send {
    fn complete(&mut self, src: &str, filename: &str, offset: usize, ctx: &BuildContext) -> Vec<Candidate>;
}

/// An engine that never proposes anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCandidates;

impl CandidateEngine for NoCandidates {
    fn complete(&mut self, _: &str, _: &str, _: usize, _: &BuildContext) -> Vec<Candidate> {
        Vec::new()
    }
}

type EngineFactory = Box<dyn Fn(&BuildContext) -> Box<dyn CandidateEngine> + Send + Sync>;

struct EngineSlot {
    engine: Option<Box<dyn CandidateEngine>>,
    generation: u64,
}

/// Holds the candidate engine for the current configuration.
pub struct CompletionHost {
    slot: Mutex<EngineSlot>,
    factory: EngineFactory,
}

impl fmt::Debug for CompletionHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.lock();
        f.debug_struct("CompletionHost")
            .field("built", &slot.engine.is_some())
            .field("generation", &slot.generation)
            .finish()
    }
}

impl Default for CompletionHost {
    fn default() -> Self {
        Self::new(|_| Box::new(NoCandidates))
    }
}

impl CompletionHost {
    pub fn new(factory: impl Fn(&BuildContext) -> Box<dyn CandidateEngine> + Send + Sync + 'static) -> Self {
        Self {
            slot: Mutex::new(EngineSlot {
                engine: None,
                generation: 0,
            }),
            factory: Box::new(factory),
        }
    }

    /// Candidates at `offset`, from an engine built for `ctx`'s generation.
    pub fn complete(&self, ctx: &Versioned<BuildContext>, src: &str, filename: &str, offset: usize) -> Vec<Candidate> {
        let mut slot = self.slot.lock();
        if slot.engine.is_none() || slot.generation != ctx.generation() {
            tracing::debug!(generation = ctx.generation(), "building candidate engine");
            slot.engine = Some((self.factory)(ctx.get()));
            slot.generation = ctx.generation();
        }
        match slot.engine.as_mut() {
            Some(engine) => engine.complete(src, filename, offset, ctx.get()),
            None => Vec::new(),
        }
    }

    /// The signature of the function called around `offset`.
    ///
    /// Finds the innermost call containing the offset, completes at the end
    /// of its function name and keeps the first candidate of that name
    /// (ignoring case). Empty when there is no call or no match.
    pub fn calltip(&self, ctx: &Versioned<BuildContext>, src: &str, filename: &str, offset: usize) -> Vec<Candidate> {
        let Some(ident) = calltip_ident(src, offset) else {
            return Vec::new();
        };
        let end = usize::from(ident.range.end());
        let wanted = ident.name.to_lowercase();
        self.complete(ctx, src, filename, end)
            .into_iter()
            .find(|candidate| candidate.name.to_lowercase() == wanted)
            .into_iter()
            .collect()
    }
}

/// Function name of the innermost call containing `offset`, if that name
/// ends on the cursor's line.
pub fn calltip_ident(src: &str, offset: usize) -> Option<Ident> {
    let parse = syntax::parse(src);
    let pos = TextSize::try_from(offset).ok()?;
    let mut innermost: Option<Ident> = None;
    let mut find_call = |expr: &Expr| {
        if let ExprKind::Call { fun, .. } = &expr.kind {
            if expr.range.contains_inclusive(pos) {
                if let Some(ident) = call_name(fun) {
                    innermost = Some(ident.clone());
                }
            }
        }
        true
    };
    visit::walk_file(&mut find_call, &parse.file);
    let ident = innermost?;

    if offset <= src.len() {
        let lines = LineIndex::new(src);
        if lines.line_col(ident.range.end()).line != lines.line_col(pos).line {
            return None;
        }
    }
    Some(ident)
}

fn call_name(fun: &Expr) -> Option<&Ident> {
    match &fun.unparen().kind {
        ExprKind::Ident(ident) => Some(ident),
        ExprKind::Selector { sel, .. } => Some(sel),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Fixed(Vec<Candidate>);

    impl CandidateEngine for Fixed {
        fn complete(&mut self, _: &str, _: &str, _: usize, _: &BuildContext) -> Vec<Candidate> {
            self.0.clone()
        }
    }

    fn candidate(name: &str, ty: &str) -> Candidate {
        Candidate {
            name: name.into(),
            ty: ty.into(),
            class: "func".into(),
        }
    }

    const SRC: &str = "package p\n\nfunc f() {\n\tfmt.Println(strings.ToUpper(s), 1)\n}\n";

    #[test]
    fn test_calltip_ident_innermost() {
        let inner = SRC.find("ToUpper(").unwrap() + "ToUpper(".len();
        assert_eq!(calltip_ident(SRC, inner).unwrap().name, "ToUpper");

        let outer = SRC.find(", 1").unwrap() + 2;
        assert_eq!(calltip_ident(SRC, outer).unwrap().name, "Println");
    }

    #[test]
    fn test_calltip_ident_outside_call() {
        assert!(calltip_ident(SRC, 3).is_none());
    }

    #[test]
    fn test_calltip_ident_other_line() {
        let src = "package p\n\nfunc f() {\n\tg(\n\t\tx)\n}\n";
        let offset = src.find("x)").unwrap();
        assert!(calltip_ident(src, offset).is_none());
    }

    #[test]
    fn test_calltip_filters_case_insensitively() {
        let host = CompletionHost::new(|_| {
            Box::new(Fixed(vec![
                candidate("Print", "func(a ...interface{})"),
                candidate("PrintLn", "func(a ...interface{}) (n int, err error)"),
                candidate("Println", "func(a ...interface{}) (n int, err error)"),
            ]))
        });
        let ctx = Versioned::new(BuildContext::default());
        let offset = SRC.find(", 1").unwrap() + 2;
        let tips = host.calltip(&ctx, SRC, "p.go", offset);
        assert_eq!(tips, vec![candidate("PrintLn", "func(a ...interface{}) (n int, err error)")]);
    }

    #[test]
    fn test_calltip_no_match_is_empty() {
        let host = CompletionHost::default();
        let ctx = Versioned::new(BuildContext::default());
        let offset = SRC.find(", 1").unwrap() + 2;
        assert!(host.calltip(&ctx, SRC, "p.go", offset).is_empty());
    }

    #[test]
    fn test_engine_rebuilt_on_new_generation() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let host = CompletionHost::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::new(NoCandidates)
        });
        let mut ctx = Versioned::new(BuildContext::default());
        host.complete(&ctx, "", "p.go", 0);
        host.complete(&ctx, "", "p.go", 0);
        assert_eq!(builds.load(Ordering::SeqCst), 1);

        assert!(!ctx.set(BuildContext::default()));
        host.complete(&ctx, "", "p.go", 0);
        assert_eq!(builds.load(Ordering::SeqCst), 1);

        assert!(ctx.set(BuildContext::default().with_gopath(["/home/u/go"])));
        host.complete(&ctx, "", "p.go", 0);
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }
}
