//! Structured diagnostic records.
//!
//! The resolver reports problems as `(source, offset, length, code, args)`
//! records. It never renders human-readable text; `format_message` and the
//! `DIAGNOSTIC_MESSAGES` table exist for presentation layers and tests.

use crate::source::Source;
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCategory {
    CompileTimeError,
    StaticWarning,
    StaticTypeWarning,
    Hint,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

pub mod diagnostic_codes {
    // Compile-time errors
    pub const URI_DOES_NOT_EXIST: u32 = 1001;
    pub const IMPORT_OF_NON_LIBRARY: u32 = 1002;
    pub const EXPORT_OF_NON_LIBRARY: u32 = 1003;
    pub const PART_OF_NON_PART: u32 = 1004;
    pub const DUPLICATE_DEFINITION: u32 = 1005;
    pub const INVALID_ANNOTATION: u32 = 1006;
    pub const LABEL_UNDEFINED: u32 = 1007;
    pub const LABEL_IN_OUTER_SCOPE: u32 = 1008;
    pub const SUPER_IN_INVALID_CONTEXT: u32 = 1009;
    pub const UNDEFINED_CONSTRUCTOR_IN_INITIALIZER: u32 = 1010;
    pub const UNDEFINED_CONSTRUCTOR_IN_INITIALIZER_DEFAULT: u32 = 1011;
    pub const REDIRECT_TO_MISSING_CONSTRUCTOR: u32 = 1012;
    pub const INITIALIZER_FOR_NON_EXISTENT_FIELD: u32 = 1013;
    pub const DUPLICATE_NAMED_ARGUMENT: u32 = 1014;
    pub const EXTENDS_NON_CLASS: u32 = 1015;
    pub const IMPLEMENTS_NON_CLASS: u32 = 1016;
    pub const MIXIN_OF_NON_CLASS: u32 = 1017;
    pub const RECURSIVE_INTERFACE_INHERITANCE: u32 = 1018;
    pub const REFERENCED_BEFORE_DECLARATION: u32 = 1019;
    pub const DEFERRED_LOADING_DISABLED: u32 = 1020;
    pub const BREAK_OUTSIDE_LOOP: u32 = 1021;

    // Static warnings
    pub const UNDEFINED_IDENTIFIER: u32 = 2001;
    pub const UNDEFINED_CLASS: u32 = 2002;
    pub const NOT_A_TYPE: u32 = 2003;
    pub const AMBIGUOUS_IMPORT: u32 = 2004;
    pub const NOT_ENOUGH_REQUIRED_ARGUMENTS: u32 = 2005;
    pub const EXTRA_POSITIONAL_ARGUMENTS: u32 = 2006;
    pub const UNDEFINED_NAMED_PARAMETER: u32 = 2007;
    pub const NEW_WITH_UNDEFINED_CONSTRUCTOR: u32 = 2008;
    pub const NEW_WITH_UNDEFINED_CONSTRUCTOR_DEFAULT: u32 = 2009;
    pub const NEW_WITH_NON_TYPE: u32 = 2010;
    pub const PART_OF_DIFFERENT_LIBRARY: u32 = 2011;
    pub const STATIC_ACCESS_TO_INSTANCE_MEMBER: u32 = 2012;
    pub const UNDEFINED_SUPER_GETTER: u32 = 2013;
    pub const UNDEFINED_SUPER_SETTER: u32 = 2014;
    pub const INCONSISTENT_METHOD_INHERITANCE_GETTER_AND_METHOD: u32 = 2015;

    // Static type warnings
    pub const UNDEFINED_METHOD: u32 = 3001;
    pub const UNDEFINED_FUNCTION: u32 = 3002;
    pub const UNDEFINED_GETTER: u32 = 3003;
    pub const UNDEFINED_SETTER: u32 = 3004;
    pub const UNDEFINED_OPERATOR: u32 = 3005;
    pub const UNDEFINED_SUPER_METHOD: u32 = 3006;
    pub const INCONSISTENT_METHOD_INHERITANCE: u32 = 3007;
    pub const WRONG_NUMBER_OF_TYPE_ARGUMENTS: u32 = 3008;
    pub const INSTANCE_ACCESS_TO_STATIC_MEMBER: u32 = 3009;

    // Hints (propagated-type analysis)
    pub const UNDEFINED_METHOD_HINT: u32 = 4001;
    pub const UNDEFINED_GETTER_HINT: u32 = 4002;
    pub const UNDEFINED_SETTER_HINT: u32 = 4003;
    pub const UNDEFINED_OPERATOR_HINT: u32 = 4004;
}

pub mod diagnostic_messages {
    pub const URI_DOES_NOT_EXIST: &str = "Target of URI does not exist: '{0}'";
    pub const IMPORT_OF_NON_LIBRARY: &str = "The imported library '{0}' must not have a part-of directive";
    pub const EXPORT_OF_NON_LIBRARY: &str = "The exported library '{0}' must not have a part-of directive";
    pub const PART_OF_NON_PART: &str = "The included part '{0}' must have a part-of directive";
    pub const DUPLICATE_DEFINITION: &str = "The name '{0}' is already defined";
    pub const INVALID_ANNOTATION: &str = "Annotation can be only constant variable or constant constructor invocation";
    pub const LABEL_UNDEFINED: &str = "Cannot reference undefined label '{0}'";
    pub const LABEL_IN_OUTER_SCOPE: &str = "Cannot reference label '{0}' declared in an outer method";
    pub const SUPER_IN_INVALID_CONTEXT: &str = "Invalid context for 'super' invocation";
    pub const UNDEFINED_CONSTRUCTOR_IN_INITIALIZER: &str = "The class '{0}' does not have a generative constructor '{1}'";
    pub const UNDEFINED_CONSTRUCTOR_IN_INITIALIZER_DEFAULT: &str = "The class '{0}' does not have a default generative constructor";
    pub const REDIRECT_TO_MISSING_CONSTRUCTOR: &str = "The constructor '{0}' could not be found in '{1}'";
    pub const INITIALIZER_FOR_NON_EXISTENT_FIELD: &str = "'{0}' is not a variable in the enclosing class";
    pub const DUPLICATE_NAMED_ARGUMENT: &str = "The argument for the named parameter '{0}' was already specified";
    pub const EXTENDS_NON_CLASS: &str = "Classes can only extend other classes";
    pub const IMPLEMENTS_NON_CLASS: &str = "Classes can only implement other classes";
    pub const MIXIN_OF_NON_CLASS: &str = "Classes can only mixin other classes";
    pub const RECURSIVE_INTERFACE_INHERITANCE: &str = "'{0}' cannot be a superinterface of itself";
    pub const REFERENCED_BEFORE_DECLARATION: &str = "Local variable '{0}' cannot be referenced before it is declared";
    pub const DEFERRED_LOADING_DISABLED: &str = "Deferred loading is not enabled; '{0}' is imported eagerly";
    pub const BREAK_OUTSIDE_LOOP: &str = "A break or continue statement must be inside a loop or switch";

    pub const UNDEFINED_IDENTIFIER: &str = "Undefined name '{0}'";
    pub const UNDEFINED_CLASS: &str = "Undefined class '{0}'";
    pub const NOT_A_TYPE: &str = "{0} is not a type";
    pub const AMBIGUOUS_IMPORT: &str = "The name '{0}' is defined in the libraries {1}";
    pub const NOT_ENOUGH_REQUIRED_ARGUMENTS: &str = "{0} required argument(s) expected, but {1} found";
    pub const EXTRA_POSITIONAL_ARGUMENTS: &str = "{0} positional arguments expected, but {1} found";
    pub const UNDEFINED_NAMED_PARAMETER: &str = "The named parameter '{0}' is not defined";
    pub const NEW_WITH_UNDEFINED_CONSTRUCTOR: &str = "The class '{0}' does not have a constructor '{1}'";
    pub const NEW_WITH_UNDEFINED_CONSTRUCTOR_DEFAULT: &str = "The class '{0}' does not have a default constructor";
    pub const NEW_WITH_NON_TYPE: &str = "The name '{0}' is not a class";
    pub const PART_OF_DIFFERENT_LIBRARY: &str = "Expected this library to be part of '{0}', not '{1}'";
    pub const STATIC_ACCESS_TO_INSTANCE_MEMBER: &str = "Instance member '{0}' cannot be accessed using static access";
    pub const UNDEFINED_SUPER_GETTER: &str = "There is no such getter '{0}' in '{1}'";
    pub const UNDEFINED_SUPER_SETTER: &str = "There is no such setter '{0}' in '{1}'";
    pub const INCONSISTENT_METHOD_INHERITANCE_GETTER_AND_METHOD: &str = "'{0}' is inherited as a getter and also a method";

    pub const UNDEFINED_METHOD: &str = "The method '{0}' is not defined for the class '{1}'";
    pub const UNDEFINED_FUNCTION: &str = "The function '{0}' is not defined";
    pub const UNDEFINED_GETTER: &str = "There is no such getter '{0}' in '{1}'";
    pub const UNDEFINED_SETTER: &str = "There is no such setter '{0}' in '{1}'";
    pub const UNDEFINED_OPERATOR: &str = "There is no such operator '{0}' in '{1}'";
    pub const UNDEFINED_SUPER_METHOD: &str = "The method '{0}' is not defined in a superclass of '{1}'";
    pub const INCONSISTENT_METHOD_INHERITANCE: &str = "'{0}' is inherited by at least two interfaces inconsistently, from {1}";
    pub const WRONG_NUMBER_OF_TYPE_ARGUMENTS: &str = "The type '{0}' is declared with {1} type parameters, but {2} type arguments were given";
    pub const INSTANCE_ACCESS_TO_STATIC_MEMBER: &str = "Static member '{0}' cannot be accessed using instance access";

    pub const UNDEFINED_METHOD_HINT: &str = "The method '{0}' is not defined for the class '{1}'";
    pub const UNDEFINED_GETTER_HINT: &str = "There is no such getter '{0}' in '{1}'";
    pub const UNDEFINED_SETTER_HINT: &str = "There is no such setter '{0}' in '{1}'";
    pub const UNDEFINED_OPERATOR_HINT: &str = "There is no such operator '{0}' in '{1}'";
}

macro_rules! diagnostic_table {
    ($($category:ident => [$($name:ident),* $(,)?]),* $(,)?) => {
        pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
            $($(DiagnosticMessage {
                code: diagnostic_codes::$name,
                category: DiagnosticCategory::$category,
                message: diagnostic_messages::$name,
            },)*)*
        ];
    };
}

diagnostic_table! {
    CompileTimeError => [
        URI_DOES_NOT_EXIST,
        IMPORT_OF_NON_LIBRARY,
        EXPORT_OF_NON_LIBRARY,
        PART_OF_NON_PART,
        DUPLICATE_DEFINITION,
        INVALID_ANNOTATION,
        LABEL_UNDEFINED,
        LABEL_IN_OUTER_SCOPE,
        SUPER_IN_INVALID_CONTEXT,
        UNDEFINED_CONSTRUCTOR_IN_INITIALIZER,
        UNDEFINED_CONSTRUCTOR_IN_INITIALIZER_DEFAULT,
        REDIRECT_TO_MISSING_CONSTRUCTOR,
        INITIALIZER_FOR_NON_EXISTENT_FIELD,
        DUPLICATE_NAMED_ARGUMENT,
        EXTENDS_NON_CLASS,
        IMPLEMENTS_NON_CLASS,
        MIXIN_OF_NON_CLASS,
        RECURSIVE_INTERFACE_INHERITANCE,
        REFERENCED_BEFORE_DECLARATION,
        DEFERRED_LOADING_DISABLED,
        BREAK_OUTSIDE_LOOP,
    ],
    StaticWarning => [
        UNDEFINED_IDENTIFIER,
        UNDEFINED_CLASS,
        NOT_A_TYPE,
        AMBIGUOUS_IMPORT,
        NOT_ENOUGH_REQUIRED_ARGUMENTS,
        EXTRA_POSITIONAL_ARGUMENTS,
        UNDEFINED_NAMED_PARAMETER,
        NEW_WITH_UNDEFINED_CONSTRUCTOR,
        NEW_WITH_UNDEFINED_CONSTRUCTOR_DEFAULT,
        NEW_WITH_NON_TYPE,
        PART_OF_DIFFERENT_LIBRARY,
        STATIC_ACCESS_TO_INSTANCE_MEMBER,
        UNDEFINED_SUPER_GETTER,
        UNDEFINED_SUPER_SETTER,
        INCONSISTENT_METHOD_INHERITANCE_GETTER_AND_METHOD,
    ],
    StaticTypeWarning => [
        UNDEFINED_METHOD,
        UNDEFINED_FUNCTION,
        UNDEFINED_GETTER,
        UNDEFINED_SETTER,
        UNDEFINED_OPERATOR,
        UNDEFINED_SUPER_METHOD,
        INCONSISTENT_METHOD_INHERITANCE,
        WRONG_NUMBER_OF_TYPE_ARGUMENTS,
        INSTANCE_ACCESS_TO_STATIC_MEMBER,
    ],
    Hint => [
        UNDEFINED_METHOD_HINT,
        UNDEFINED_GETTER_HINT,
        UNDEFINED_SETTER_HINT,
        UNDEFINED_OPERATOR_HINT,
    ],
}

/// Look up the message entry for a diagnostic code.
pub fn get_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|msg| msg.code == code)
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub source: Source,
    pub start: u32,
    pub length: u32,
    pub code: u32,
    pub category: DiagnosticCategory,
    pub args: Vec<String>,
}

impl Diagnostic {
    /// Create a diagnostic whose category comes from the message table.
    pub fn new(source: Source, start: u32, length: u32, code: u32, args: Vec<String>) -> Self {
        let category = get_message(code)
            .map(|msg| msg.category)
            .unwrap_or(DiagnosticCategory::CompileTimeError);
        Self {
            source,
            start,
            length,
            code,
            category,
            args,
        }
    }

    #[inline]
    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    /// Render the template for this code with the recorded arguments.
    pub fn message(&self) -> String {
        let template = get_message(self.code).map(|m| m.message).unwrap_or("");
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        format_message(template, &args)
    }

    /// Move this diagnostic by `delta` bytes.
    pub fn shifted(mut self, delta: i64) -> Self {
        self.start = (i64::from(self.start) + delta).max(0) as u32;
        self
    }
}

/// Receiver for diagnostics produced during resolution.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Collects every reported diagnostic in order.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticCollector {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code(&self, code: u32) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.code == code)
    }

    pub fn count(&self, code: u32) -> usize {
        self.with_code(code).count()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

#[cfg(test)]
#[path = "../tests/diagnostics_tests.rs"]
mod tests;
