//! # Built-in Keywords
//!
//! One unit struct per keyword, each implementing [`Keyword`]. The structs
//! are public so a caller can re-register a built-in under another name or
//! wrap it in a custom capability.
//!
//! | Module | Keywords |
//! |---|---|
//! | `types` | `type`, `disallow` |
//! | `object` | `required`, `dependencies`, `properties`, `patternProperties`, `additionalProperties`, `minProperties`, `maxProperties`, `propertyNames` |
//! | `array` | `items`, `additionalItems`, `minItems`, `maxItems`, `uniqueItems`, `contains` |
//! | `string` | `minLength`, `maxLength`, `pattern`, `format` |
//! | `numeric` | `minimum`, `maximum`, `exclusiveMinimum`, `exclusiveMaximum`, `multipleOf`, `divisibleBy` |
//! | `literal` | `enum`, `const` |
//! | `combinators` | `allOf`, `anyOf`, `oneOf`, `not`, `extends` |
//! | `conditional` | `if` (with `then` / `else`) |

pub mod array;
pub mod combinators;
pub mod conditional;
pub mod literal;
pub mod numeric;
pub mod object;
pub mod string;
pub mod types;

use crate::registry::Keyword;

fn entry<K: Keyword + 'static>(name: &'static str, keyword: K) -> (&'static str, Box<dyn Keyword>) {
    (name, Box::new(keyword))
}

/// Every built-in keyword, in evaluation order.
pub(crate) fn builtins() -> Vec<(&'static str, Box<dyn Keyword>)> {
    vec![
        entry("type", types::Type),
        entry("disallow", types::Disallow),
        entry("extends", combinators::Extends),
        entry("required", object::Required),
        entry("dependencies", object::Dependencies),
        entry("properties", object::Properties),
        entry("patternProperties", object::PatternProperties),
        entry("additionalProperties", object::AdditionalProperties),
        entry("minProperties", object::MinProperties),
        entry("maxProperties", object::MaxProperties),
        entry("propertyNames", object::PropertyNames),
        entry("items", array::Items),
        entry("additionalItems", array::AdditionalItems),
        entry("minItems", array::MinItems),
        entry("maxItems", array::MaxItems),
        entry("uniqueItems", array::UniqueItems),
        entry("contains", array::Contains),
        entry("minLength", string::MinLength),
        entry("maxLength", string::MaxLength),
        entry("pattern", string::Pattern),
        entry("format", string::Format),
        entry("minimum", numeric::Minimum),
        entry("maximum", numeric::Maximum),
        entry("exclusiveMinimum", numeric::ExclusiveMinimum),
        entry("exclusiveMaximum", numeric::ExclusiveMaximum),
        entry("multipleOf", numeric::MultipleOf),
        entry("divisibleBy", numeric::DivisibleBy),
        entry("enum", literal::Enum),
        entry("const", literal::Const),
        entry("allOf", combinators::AllOf),
        entry("anyOf", combinators::AnyOf),
        entry("oneOf", combinators::OneOf),
        entry("not", combinators::Not),
        entry("if", conditional::If),
    ]
}

/// `"a"`, `"a or b"`, `"a, b or c"`.
pub(crate) fn join_or(words: &[&str]) -> String {
    match words {
        [] => String::new(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    }
}
