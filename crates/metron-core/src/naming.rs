//! Metric namespace resolution
//!
//! Turns a [`Subject`] (a string, a type, a value, or a module path) into a
//! dotted namespace such as `my_app.worker.Downloader`. Resolution is total:
//! anything that cleans up to nothing becomes [`UNNAMED`].

use std::any::type_name;
use std::borrow::Cow;

/// Namespace used when nothing usable is left after normalization
pub const UNNAMED: &str = "unnamed";

/// Module label given to primitive types, which have no declaring module
pub const BUILTIN_MODULE: &str = "__builtin__";

/// Something a metrics namespace can be derived from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject<'a> {
    /// No name at all
    Absent,
    /// A literal name, used verbatim
    Text(Cow<'a, str>),
    /// A type, named by its module path and type name
    Type(&'static str),
    /// A value, named through its type
    Instance(&'static str),
    /// A module path such as the output of `module_path!()`
    Module(Cow<'a, str>),
    /// Any other value (primitives and the like), named through its type
    Other(&'static str),
}

impl<'a> Subject<'a> {
    /// Subject naming the type `T`
    #[must_use]
    pub fn of_type<T: ?Sized>() -> Self {
        Subject::Type(type_name::<T>())
    }

    /// Subject naming the type of `value`
    #[must_use]
    pub fn instance<T: ?Sized>(_value: &T) -> Self {
        Subject::Instance(type_name::<T>())
    }

    /// Subject naming a module path (`crate::a::b` or `crate.a.b`)
    #[must_use]
    pub fn module(path: impl Into<Cow<'a, str>>) -> Self {
        Subject::Module(path.into())
    }

    /// Raw label before normalization
    #[must_use]
    pub fn label(&self) -> Cow<'_, str> {
        match self {
            Subject::Absent => Cow::Borrowed(""),
            Subject::Text(text) => Cow::Borrowed(text.as_ref()),
            Subject::Type(name) | Subject::Instance(name) | Subject::Other(name) => {
                Cow::Owned(type_label(name))
            }
            Subject::Module(path) => Cow::Owned(path.replace("::", ".")),
        }
    }
}

/// `<module>.<TypeName>` for a `std::any::type_name` string.
fn type_label(name: &str) -> String {
    // Only the outer path decides whether the type has a declaring module;
    // generic arguments may carry paths of their own.
    let outer = name.split('<').next().unwrap_or(name);
    if outer.contains("::") {
        name.replace("::", ".")
    } else {
        format!("{}.{}", BUILTIN_MODULE, name)
    }
}

impl<'a> From<&'a str> for Subject<'a> {
    fn from(text: &'a str) -> Self {
        Subject::Text(Cow::Borrowed(text))
    }
}

impl<'a> From<&'a String> for Subject<'a> {
    fn from(text: &'a String) -> Self {
        Subject::Text(Cow::Borrowed(text.as_str()))
    }
}

impl From<String> for Subject<'_> {
    fn from(text: String) -> Self {
        Subject::Text(Cow::Owned(text))
    }
}

impl From<()> for Subject<'_> {
    fn from(_: ()) -> Self {
        Subject::Absent
    }
}

impl<'a, T> From<Option<T>> for Subject<'a>
where
    T: Into<Subject<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Subject::Absent, Into::into)
    }
}

macro_rules! primitive_subjects {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Subject<'_> {
                fn from(_: $ty) -> Self {
                    Subject::Other(type_name::<$ty>())
                }
            }
        )*
    };
}

primitive_subjects!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
);

/// Resolve `thing` (plus an optional `extra` suffix) into a metrics namespace
///
/// ```
/// use metron_core::naming::{resolve, Subject};
///
/// assert_eq!(resolve("abc(123)", ""), "abc.123");
/// assert_eq!(resolve("myapp", "jim"), "myapp.jim");
/// assert_eq!(resolve(5_i32, ""), "__builtin__.i32");
/// assert_eq!(resolve(Subject::Absent, ""), "unnamed");
/// ```
pub fn resolve<'a>(thing: impl Into<Subject<'a>>, extra: &str) -> String {
    let subject = thing.into();
    let mut raw = subject.label().into_owned();
    if !extra.is_empty() {
        raw.push('.');
        raw.push_str(extra);
    }
    normalize(&raw)
}

/// Clean a dotted name
///
/// Characters other than ASCII alphanumerics, `_` and `.` become separators,
/// empty segments are dropped, and an empty result becomes [`UNNAMED`].
#[must_use]
pub fn normalize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                c
            } else {
                '.'
            }
        })
        .collect();

    let segments: Vec<&str> = cleaned.split('.').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        UNNAMED.to_string()
    } else {
        segments.join(".")
    }
}
