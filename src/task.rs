//! Task identity and the benchmark registry.
//!
//! A [`Benchmark`] owns a set of named tasks plus the input generators they
//! draw from. Input generation is keyed by an explicit [`InputKey`] string:
//! a task names the key its workload consumes, and adding a task whose key
//! has no registered generator is a defect in the benchmark definition and
//! panics at registration time. Generated inputs are cached per (key, size)
//! and shared between tasks until the cache is cleared.

use std::any::Any;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::Error;
use crate::measure::Stopwatch;
use crate::size::Size;

/// Identifies one task: an optional label plus a title.
///
/// Canonical text form is `title` or `[label]title`. Both parts forbid
/// `[`, `]` and newlines; the title must be non-empty and start with a
/// letter. Ordering is by label then title, comparing case-insensitively
/// with numeric digit runs ordered by value, so `task 10` sorts after
/// `task 9`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaskID {
    label: String,
    title: String,
}

impl TaskID {
    /// A task ID with no label.
    ///
    /// Panics on a malformed title.
    pub fn new(title: impl Into<String>) -> TaskID {
        TaskID::with_label("", title)
    }

    /// A task ID with an explicit label (may be empty).
    ///
    /// Panics on a malformed label or title.
    pub fn with_label(label: impl Into<String>, title: impl Into<String>) -> TaskID {
        let label = label.into();
        let title = title.into();
        if let Err(reason) = validate(&label, &title) {
            panic!("invalid task name '[{}]{}': {}", label, title, reason);
        }
        TaskID { label, title }
    }

    /// Fallible constructor for data read from documents or selections.
    pub fn checked(label: impl Into<String>, title: impl Into<String>) -> Result<TaskID, Error> {
        let label = label.into();
        let title = title.into();
        match validate(&label, &title) {
            Ok(()) => Ok(TaskID { label, title }),
            Err(reason) => Err(Error::InvalidTaskName {
                name: if label.is_empty() { title } else { format!("[{}]{}", label, title) },
                reason: reason.to_string(),
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

fn validate(label: &str, title: &str) -> Result<(), &'static str> {
    let forbidden = |s: &str| s.contains(['[', ']', '\n']);
    if forbidden(label) {
        return Err("label must not contain brackets or newlines");
    }
    if forbidden(title) {
        return Err("title must not contain brackets or newlines");
    }
    match title.chars().next() {
        None => Err("title must not be empty"),
        Some(first) if !first.is_alphabetic() => Err("title must start with a letter"),
        Some(_) => Ok(()),
    }
}

impl fmt::Display for TaskID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "[{}]{}", self.label, self.title)
        }
    }
}

impl FromStr for TaskID {
    type Err = Error;

    fn from_str(text: &str) -> Result<TaskID, Error> {
        match text.strip_prefix('[') {
            Some(rest) => match rest.split_once(']') {
                Some((label, title)) => TaskID::checked(label, title),
                None => Err(Error::InvalidTaskName {
                    name: text.to_string(),
                    reason: "unterminated label".to_string(),
                }),
            },
            None => TaskID::checked("", text),
        }
    }
}

impl Ord for TaskID {
    fn cmp(&self, other: &TaskID) -> Ordering {
        natural_cmp(&self.label, &other.label)
            .then_with(|| natural_cmp(&self.title, &other.title))
            // Natural comparison conflates case and leading zeros; the
            // exact tie-break keeps the order strict and consistent with Eq.
            .then_with(|| self.label.cmp(&other.label))
            .then_with(|| self.title.cmp(&other.title))
    }
}

impl PartialOrd for TaskID {
    fn partial_cmp(&self, other: &TaskID) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Case-insensitive comparison with digit runs ordered numerically.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();
    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let run_a = take_digits(&mut a);
                let run_b = take_digits(&mut b);
                match cmp_digit_runs(&run_a, &run_b) {
                    Ordering::Equal => {}
                    unequal => return unequal,
                }
            }
            (Some(x), Some(y)) => {
                let folded = x.to_lowercase().cmp(y.to_lowercase());
                if folded != Ordering::Equal {
                    return folded;
                }
                a.next();
                b.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

/// Compare two all-digit strings by numeric value.
fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Names an input shape a generator can produce.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InputKey(std::borrow::Cow<'static, str>);

impl InputKey {
    /// The size itself, as a `u64`.
    pub const U64: InputKey = InputKey(std::borrow::Cow::Borrowed("u64"));
    /// A random permutation of `0..size`, as a `Vec<u64>`.
    pub const SHUFFLED_U64S: InputKey = InputKey(std::borrow::Cow::Borrowed("shuffled-u64s"));
    /// Two independent permutations of `0..size`, as `(Vec<u64>, Vec<u64>)`.
    pub const PAIR_OF_SHUFFLED_U64S: InputKey =
        InputKey(std::borrow::Cow::Borrowed("pair-of-shuffled-u64s"));
    /// Random insertion positions: the i-th value is uniform in `0..=i`.
    /// As a `Vec<u64>`.
    pub const INSERTIONS: InputKey = InputKey(std::borrow::Cow::Borrowed("insertions"));

    /// A key for a caller-registered generator.
    pub fn custom(name: impl Into<String>) -> InputKey {
        InputKey(std::borrow::Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The timed part of one task invocation. Owns a share of the generated
/// input, so it carries no borrows.
pub type TaskBody = Box<dyn FnMut(&mut Stopwatch<'_>)>;

type PrepareFn = Box<dyn Fn(Rc<dyn Any>) -> Option<TaskBody>>;
type Generator = Box<dyn FnMut(u64) -> Rc<dyn Any>>;

/// One registered workload.
pub struct Task {
    id: TaskID,
    input: InputKey,
    max_size: Option<Size>,
    prepare: PrepareFn,
}

impl Task {
    pub fn id(&self) -> &TaskID {
        &self.id
    }

    pub fn input_key(&self) -> &InputKey {
        &self.input
    }

    /// Sizes above this are skipped without a sample or an error.
    pub fn max_size(&self) -> Option<Size> {
        self.max_size
    }

    /// Bind the task to a generated input. `None` declines this input,
    /// which is a soft skip.
    pub(crate) fn prepare(&self, input: Rc<dyn Any>) -> Option<TaskBody> {
        (self.prepare)(input)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("input", &self.input)
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}

/// A collection of tasks and the input generators they consume.
pub struct Benchmark {
    tasks: Vec<Task>,
    generators: HashMap<InputKey, Generator>,
    input_cache: HashMap<(InputKey, u64), Rc<dyn Any>>,
}

impl Benchmark {
    /// An empty benchmark with the built-in generators registered.
    pub fn new() -> Benchmark {
        let mut benchmark = Benchmark {
            tasks: Vec::new(),
            generators: HashMap::new(),
            input_cache: HashMap::new(),
        };
        benchmark.register_input(InputKey::U64, |size| size);
        benchmark.register_input(InputKey::SHUFFLED_U64S, shuffled);
        benchmark.register_input(InputKey::PAIR_OF_SHUFFLED_U64S, |size| {
            (shuffled(size), shuffled(size))
        });
        benchmark.register_input(InputKey::INSERTIONS, |size| {
            let mut rng = rand::rng();
            (0..size).map(|i| rng.random_range(0..=i)).collect::<Vec<u64>>()
        });
        benchmark
    }

    /// Register (or replace) the generator for `key`.
    pub fn register_input<I, G>(&mut self, key: InputKey, mut generator: G)
    where
        I: Any,
        G: FnMut(u64) -> I + 'static,
    {
        self.generators
            .insert(key, Box::new(move |size| Rc::new(generator(size)) as Rc<dyn Any>));
    }

    /// Add a task whose prepare step binds the input and may decline it.
    ///
    /// `name` is the task's canonical text form (`title` or
    /// `[label]title`). Panics on a malformed name, a duplicate name, or an
    /// input key with no registered generator.
    pub fn add<I, F>(&mut self, name: &str, input: InputKey, max_size: Option<Size>, prepare: F)
    where
        I: Any,
        F: Fn(Rc<I>) -> Option<TaskBody> + 'static,
    {
        let id: TaskID = match name.parse() {
            Ok(id) => id,
            Err(error) => panic!("{}", error),
        };
        assert!(
            !self.tasks.iter().any(|task| task.id == id),
            "duplicate task '{}'",
            id
        );
        assert!(
            self.generators.contains_key(&input),
            "task '{}' uses input key '{}', which has no registered generator",
            id,
            input
        );
        let name = id.to_string();
        let prepare: PrepareFn = Box::new(move |input: Rc<dyn Any>| {
            let input = input
                .downcast::<I>()
                .unwrap_or_else(|_| panic!("task '{}' received an input of the wrong type", name));
            prepare(input)
        });
        self.tasks.push(Task { id, input, max_size, prepare });
    }

    /// Add a task timed around its whole invocation.
    pub fn add_simple<I, F>(&mut self, name: &str, input: InputKey, max_size: Option<Size>, body: F)
    where
        I: Any,
        F: Fn(&I, &mut Stopwatch<'_>) + 'static,
    {
        let body = Rc::new(body);
        self.add::<I, _>(name, input, max_size, move |input: Rc<I>| {
            let body = Rc::clone(&body);
            Some(Box::new(move |stopwatch: &mut Stopwatch<'_>| body(&input, stopwatch)))
        });
    }

    /// All tasks, in registration order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Look up a task by its canonical text form.
    pub fn task_named(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id.to_string() == name)
    }

    /// The input for (`key`, `size`), generating and caching on first use.
    pub(crate) fn input_for(&mut self, key: &InputKey, size: Size) -> Rc<dyn Any> {
        if let Some(cached) = self.input_cache.get(&(key.clone(), size.get())) {
            return Rc::clone(cached);
        }
        let generator = self
            .generators
            .get_mut(key)
            .unwrap_or_else(|| panic!("no input generator registered for key '{}'", key));
        let input = generator(size.get());
        self.input_cache.insert((key.clone(), size.get()), Rc::clone(&input));
        input
    }

    /// Drop cached inputs so the next cycle regenerates them.
    pub(crate) fn clear_input_cache(&mut self) {
        self.input_cache.clear();
    }
}

impl Default for Benchmark {
    fn default() -> Benchmark {
        Benchmark::new()
    }
}

fn shuffled(size: u64) -> Vec<u64> {
    let mut values: Vec<u64> = (0..size).collect();
    values.shuffle(&mut rand::rng());
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_text_round_trip() {
        for text in ["append", "[std]append", "B-tree insert", "[v2.1]lookup 10k"] {
            let id: TaskID = text.parse().unwrap();
            assert_eq!(id.to_string(), text);
        }
        let id: TaskID = "[std]append".parse().unwrap();
        assert_eq!(id.label(), "std");
        assert_eq!(id.title(), "append");
    }

    #[test]
    fn malformed_task_ids_are_rejected() {
        for text in ["", "[std]", "1append", "[std]9 lookups", "a]b", "[std", "two\nlines"] {
            assert!(text.parse::<TaskID>().is_err(), "accepted {:?}", text);
        }
    }

    #[test]
    #[should_panic(expected = "title must start with a letter")]
    fn constructing_a_bad_title_panics() {
        TaskID::new("9 lookups");
    }

    #[test]
    fn ordering_is_by_label_then_title() {
        let a: TaskID = "[alpha]zzz".parse().unwrap();
        let b: TaskID = "[beta]aaa".parse().unwrap();
        assert!(a < b);
        let unlabeled: TaskID = "aaa".parse().unwrap();
        assert!(unlabeled < a);
    }

    #[test]
    fn ordering_treats_digit_runs_numerically() {
        let nine: TaskID = "task 9".parse().unwrap();
        let ten: TaskID = "task 10".parse().unwrap();
        assert!(nine < ten);
    }

    #[test]
    fn ordering_is_a_strict_total_order() {
        let ids: Vec<TaskID> = ["append", "Append", "task 9", "task 09", "task 10", "[x]append"]
            .iter()
            .map(|text| text.parse().unwrap())
            .collect();
        for a in &ids {
            for b in &ids {
                let forward = a.cmp(b);
                assert_eq!(forward.reverse(), b.cmp(a));
                assert_eq!(forward == Ordering::Equal, a == b);
                for c in &ids {
                    if a < b && b < c {
                        assert!(a < c);
                    }
                }
            }
        }
    }

    #[test]
    fn built_in_generators_have_the_documented_shapes() {
        let mut benchmark = Benchmark::new();
        let plain = benchmark.input_for(&InputKey::U64, Size::new(42));
        assert_eq!(*plain.downcast_ref::<u64>().unwrap(), 42);

        let shuffled = benchmark.input_for(&InputKey::SHUFFLED_U64S, Size::new(100));
        let mut values = shuffled.downcast_ref::<Vec<u64>>().unwrap().clone();
        values.sort();
        assert_eq!(values, (0..100).collect::<Vec<u64>>());

        let insertions = benchmark.input_for(&InputKey::INSERTIONS, Size::new(100));
        let insertions = insertions.downcast_ref::<Vec<u64>>().unwrap();
        assert_eq!(insertions.len(), 100);
        for (i, &position) in insertions.iter().enumerate() {
            assert!(position <= i as u64);
        }
    }

    #[test]
    fn inputs_are_cached_until_cleared() {
        let mut benchmark = Benchmark::new();
        let first = benchmark.input_for(&InputKey::SHUFFLED_U64S, Size::new(1000));
        let second = benchmark.input_for(&InputKey::SHUFFLED_U64S, Size::new(1000));
        assert!(Rc::ptr_eq(&first, &second));
        benchmark.clear_input_cache();
        let third = benchmark.input_for(&InputKey::SHUFFLED_U64S, Size::new(1000));
        assert!(!Rc::ptr_eq(&first, &third));
    }

    #[test]
    #[should_panic(expected = "no registered generator")]
    fn unregistered_input_key_panics() {
        let mut benchmark = Benchmark::new();
        benchmark.add_simple::<u64, _>(
            "sum",
            InputKey::custom("bespoke"),
            None,
            |_, _| {},
        );
    }

    #[test]
    #[should_panic(expected = "duplicate task")]
    fn duplicate_title_panics() {
        let mut benchmark = Benchmark::new();
        benchmark.add_simple::<u64, _>("sum", InputKey::U64, None, |_, _| {});
        benchmark.add_simple::<u64, _>("sum", InputKey::U64, None, |_, _| {});
    }

    #[test]
    #[should_panic(expected = "wrong type")]
    fn input_type_mismatch_panics() {
        let mut benchmark = Benchmark::new();
        // SHUFFLED_U64S generates Vec<u64>, not u64.
        benchmark.add_simple::<u64, _>("sum", InputKey::SHUFFLED_U64S, None, |_, _| {});
        let input = benchmark.input_for(&InputKey::SHUFFLED_U64S, Size::new(4));
        let task = benchmark.task_named("sum").unwrap();
        task.prepare(input);
    }

    #[test]
    fn prepare_may_decline_an_input() {
        let mut benchmark = Benchmark::new();
        benchmark.add::<u64, _>("even only", InputKey::U64, None, |size: Rc<u64>| {
            if *size % 2 != 0 {
                return None;
            }
            Some(Box::new(move |_: &mut Stopwatch<'_>| {}))
        });
        let odd = benchmark.input_for(&InputKey::U64, Size::new(3));
        let even = benchmark.input_for(&InputKey::U64, Size::new(4));
        let task = benchmark.task_named("even only").unwrap();
        assert!(task.prepare(odd).is_none());
        assert!(task.prepare(even).is_some());
    }
}
