//! Per-language node-type tables.
//!
//! All language-specific knowledge used by the analyzers lives here, keyed
//! by the [`Language`] enum: which node kinds open decision points, which
//! nest, which declare functions, imports, or classes, and which statements
//! terminate control flow. The uniform tree interface stays language-blind;
//! these tables are the only place grammar names appear.

use crate::models::syntax::Language;

/// Node kinds that increment cyclomatic complexity by one.
pub fn decision_types(language: Language) -> &'static [&'static str] {
    match language {
        Language::Go => &[
            "if_statement",
            "for_statement",
            "expression_switch_statement",
            "type_switch_statement",
            "select_statement",
            "expression_case",
            "type_case",
            "communication_case",
        ],
        Language::Rust => &[
            "if_expression",
            "while_expression",
            "for_expression",
            "loop_expression",
            "match_expression",
            "match_arm",
        ],
        Language::Python => &[
            "if_statement",
            "elif_clause",
            "while_statement",
            "for_statement",
            "except_clause",
            "case_clause",
            "conditional_expression",
        ],
        Language::TypeScript | Language::Tsx | Language::JavaScript => &[
            "if_statement",
            "while_statement",
            "do_statement",
            "for_statement",
            "for_in_statement",
            "switch_case",
            "ternary_expression",
            "catch_clause",
        ],
        Language::Java => &[
            "if_statement",
            "while_statement",
            "do_statement",
            "for_statement",
            "enhanced_for_statement",
            "switch_block_statement_group",
            "ternary_expression",
            "catch_clause",
        ],
        Language::C | Language::Cpp => &[
            "if_statement",
            "while_statement",
            "do_statement",
            "for_statement",
            "for_range_loop",
            "case_statement",
            "conditional_expression",
            "catch_clause",
        ],
        Language::CSharp => &[
            "if_statement",
            "while_statement",
            "do_statement",
            "for_statement",
            "foreach_statement",
            "switch_section",
            "conditional_expression",
            "catch_clause",
        ],
        Language::Ruby => &[
            "if",
            "unless",
            "while",
            "until",
            "for",
            "when",
            "elsif",
            "rescue",
            "conditional",
        ],
        Language::Php => &[
            "if_statement",
            "else_if_clause",
            "while_statement",
            "do_statement",
            "for_statement",
            "foreach_statement",
            "case_statement",
            "conditional_expression",
            "catch_clause",
        ],
        Language::Bash => &[
            "if_statement",
            "elif_clause",
            "while_statement",
            "for_statement",
            "case_item",
        ],
        Language::Unknown => &[],
    }
}

/// Node kinds that both add to cognitive complexity and increase its
/// nesting depth when recursed into.
pub fn cognitive_nesting_types(language: Language) -> &'static [&'static str] {
    match language {
        Language::Go => &[
            "if_statement",
            "for_statement",
            "expression_switch_statement",
            "type_switch_statement",
            "select_statement",
        ],
        Language::Rust => &[
            "if_expression",
            "while_expression",
            "for_expression",
            "loop_expression",
            "match_expression",
        ],
        Language::Python => &[
            "if_statement",
            "while_statement",
            "for_statement",
            "try_statement",
            "match_statement",
        ],
        Language::TypeScript | Language::Tsx | Language::JavaScript => &[
            "if_statement",
            "while_statement",
            "do_statement",
            "for_statement",
            "for_in_statement",
            "switch_statement",
            "try_statement",
        ],
        Language::Java => &[
            "if_statement",
            "while_statement",
            "do_statement",
            "for_statement",
            "enhanced_for_statement",
            "switch_expression",
            "try_statement",
        ],
        Language::C | Language::Cpp => &[
            "if_statement",
            "while_statement",
            "do_statement",
            "for_statement",
            "for_range_loop",
            "switch_statement",
            "try_statement",
        ],
        Language::CSharp => &[
            "if_statement",
            "while_statement",
            "do_statement",
            "for_statement",
            "foreach_statement",
            "switch_statement",
            "try_statement",
        ],
        Language::Ruby => &["if", "unless", "while", "until", "for", "case", "begin"],
        Language::Php => &[
            "if_statement",
            "while_statement",
            "do_statement",
            "for_statement",
            "foreach_statement",
            "switch_statement",
            "try_statement",
        ],
        Language::Bash => &[
            "if_statement",
            "while_statement",
            "for_statement",
            "case_statement",
        ],
        Language::Unknown => &[],
    }
}

/// Flat constructs: they add to cognitive complexity at the current depth
/// but do not nest.
pub fn cognitive_flat_types(language: Language) -> &'static [&'static str] {
    match language {
        Language::Go => &["break_statement", "continue_statement", "goto_statement"],
        Language::Rust => &["break_expression", "continue_expression"],
        Language::Python => &["break_statement", "continue_statement", "elif_clause"],
        Language::TypeScript | Language::Tsx | Language::JavaScript => {
            &["break_statement", "continue_statement"]
        }
        Language::Java => &["break_statement", "continue_statement"],
        Language::C | Language::Cpp => &["break_statement", "continue_statement", "goto_statement"],
        Language::CSharp => &["break_statement", "continue_statement", "goto_statement"],
        Language::Ruby => &["break", "next", "when", "elsif"],
        Language::Php => &["break_statement", "continue_statement", "else_if_clause"],
        Language::Bash => &["elif_clause"],
        Language::Unknown => &[],
    }
}

/// Node kinds counted by the max-nesting walk. Includes block nodes so that
/// nesting reflects brace depth, not just statement depth.
pub fn nesting_types(language: Language) -> &'static [&'static str] {
    match language {
        Language::Go => &[
            "if_statement",
            "for_statement",
            "expression_switch_statement",
            "type_switch_statement",
            "select_statement",
            "block",
        ],
        Language::Rust => &[
            "if_expression",
            "while_expression",
            "for_expression",
            "loop_expression",
            "match_expression",
            "block",
        ],
        Language::Python => &[
            "if_statement",
            "while_statement",
            "for_statement",
            "try_statement",
            "match_statement",
            "block",
        ],
        Language::TypeScript | Language::Tsx | Language::JavaScript => &[
            "if_statement",
            "while_statement",
            "do_statement",
            "for_statement",
            "for_in_statement",
            "switch_statement",
            "try_statement",
            "statement_block",
        ],
        Language::Java => &[
            "if_statement",
            "while_statement",
            "do_statement",
            "for_statement",
            "enhanced_for_statement",
            "switch_expression",
            "try_statement",
            "block",
        ],
        Language::C | Language::Cpp => &[
            "if_statement",
            "while_statement",
            "do_statement",
            "for_statement",
            "for_range_loop",
            "switch_statement",
            "try_statement",
            "compound_statement",
        ],
        Language::CSharp => &[
            "if_statement",
            "while_statement",
            "do_statement",
            "for_statement",
            "foreach_statement",
            "switch_statement",
            "try_statement",
            "block",
        ],
        Language::Ruby => &["if", "unless", "while", "until", "for", "case", "begin", "do_block"],
        Language::Php => &[
            "if_statement",
            "while_statement",
            "do_statement",
            "for_statement",
            "foreach_statement",
            "switch_statement",
            "try_statement",
            "compound_statement",
        ],
        Language::Bash => &[
            "if_statement",
            "while_statement",
            "for_statement",
            "case_statement",
        ],
        Language::Unknown => &[],
    }
}

/// Node kinds that declare a function or method.
pub fn function_types(language: Language) -> &'static [&'static str] {
    match language {
        Language::Go => &["function_declaration", "method_declaration"],
        Language::Rust => &["function_item"],
        Language::Python => &["function_definition"],
        Language::TypeScript | Language::Tsx | Language::JavaScript => &[
            "function_declaration",
            "generator_function_declaration",
            "method_definition",
            "arrow_function",
            "function_expression",
        ],
        Language::Java => &["method_declaration", "constructor_declaration"],
        Language::C => &["function_definition"],
        Language::Cpp => &["function_definition"],
        Language::CSharp => &[
            "method_declaration",
            "constructor_declaration",
            "local_function_statement",
        ],
        Language::Ruby => &["method", "singleton_method"],
        Language::Php => &["function_definition", "method_declaration"],
        Language::Bash => &["function_definition"],
        Language::Unknown => &[],
    }
}

/// Node kinds that declare a class-like type.
pub fn class_types(language: Language) -> &'static [&'static str] {
    match language {
        Language::Go => &["type_declaration"],
        Language::Rust => &["struct_item", "enum_item", "trait_item"],
        Language::Python => &["class_definition"],
        Language::TypeScript | Language::Tsx | Language::JavaScript => {
            &["class_declaration", "abstract_class_declaration"]
        }
        Language::Java => &[
            "class_declaration",
            "interface_declaration",
            "enum_declaration",
        ],
        Language::C => &["struct_specifier"],
        Language::Cpp => &["class_specifier", "struct_specifier"],
        Language::CSharp => &[
            "class_declaration",
            "interface_declaration",
            "struct_declaration",
        ],
        Language::Ruby => &["class", "module"],
        Language::Php => &["class_declaration", "interface_declaration"],
        Language::Bash => &[],
        Language::Unknown => &[],
    }
}

/// Node kinds that declare top-level variables or constants.
pub fn variable_types(language: Language) -> &'static [&'static str] {
    match language {
        Language::Go => &["var_declaration", "const_declaration"],
        Language::Rust => &["static_item", "const_item"],
        Language::Python => &["assignment"],
        Language::TypeScript | Language::Tsx | Language::JavaScript => {
            &["variable_declaration", "lexical_declaration"]
        }
        Language::Java => &["field_declaration"],
        Language::C | Language::Cpp => &["declaration"],
        Language::CSharp => &["field_declaration"],
        Language::Ruby => &[],
        Language::Php => &["const_declaration"],
        Language::Bash => &["variable_assignment"],
        Language::Unknown => &[],
    }
}

/// Node kinds representing import/include statements.
pub fn import_types(language: Language) -> &'static [&'static str] {
    match language {
        Language::Go => &["import_spec"],
        Language::Rust => &["use_declaration"],
        Language::Python => &["import_statement", "import_from_statement"],
        Language::TypeScript | Language::Tsx | Language::JavaScript => &["import_statement"],
        Language::Java => &["import_declaration"],
        Language::C | Language::Cpp => &["preproc_include"],
        Language::CSharp => &["using_directive"],
        Language::Ruby => &[],
        Language::Php => &["namespace_use_declaration"],
        Language::Bash => &[],
        Language::Unknown => &[],
    }
}

/// Node kinds representing call expressions.
pub fn call_types(language: Language) -> &'static [&'static str] {
    match language {
        Language::Go => &["call_expression"],
        Language::Rust => &["call_expression", "macro_invocation"],
        Language::Python => &["call"],
        Language::TypeScript | Language::Tsx | Language::JavaScript => {
            &["call_expression", "new_expression"]
        }
        Language::Java => &["method_invocation", "object_creation_expression"],
        Language::C | Language::Cpp => &["call_expression"],
        Language::CSharp => &["invocation_expression", "object_creation_expression"],
        Language::Ruby => &["call"],
        Language::Php => &[
            "function_call_expression",
            "member_call_expression",
            "object_creation_expression",
        ],
        Language::Bash => &["command"],
        Language::Unknown => &[],
    }
}

/// Node kinds counted as enclosing conditionals for feature-flag nesting
/// depth.
pub fn conditional_types(language: Language) -> &'static [&'static str] {
    match language {
        Language::Ruby => &["if", "unless", "case", "when", "elsif", "conditional"],
        Language::Python => &[
            "if_statement",
            "elif_clause",
            "match_statement",
            "conditional_expression",
        ],
        Language::Rust => &["if_expression", "match_expression"],
        Language::Go => &[
            "if_statement",
            "expression_switch_statement",
            "type_switch_statement",
        ],
        Language::TypeScript | Language::Tsx | Language::JavaScript => {
            &["if_statement", "switch_statement", "ternary_expression"]
        }
        Language::Java => &["if_statement", "switch_expression", "ternary_expression"],
        Language::C | Language::Cpp => {
            &["if_statement", "switch_statement", "conditional_expression"]
        }
        Language::CSharp => &["if_statement", "switch_statement", "conditional_expression"],
        Language::Php => &[
            "if_statement",
            "switch_statement",
            "conditional_expression",
        ],
        Language::Bash => &["if_statement", "case_statement"],
        Language::Unknown => &[],
    }
}

/// Logical operator tokens that add decision points.
pub fn logical_operators(language: Language) -> &'static [&'static str] {
    match language {
        Language::Python => &["and", "or"],
        Language::Ruby => &["&&", "||", "and", "or"],
        Language::Bash => &["&&", "||"],
        _ => &["&&", "||"],
    }
}

/// Node kinds hosting a binary/logical expression whose operator should be
/// inspected.
pub fn binary_expression_types(language: Language) -> &'static [&'static str] {
    match language {
        Language::Python => &["boolean_operator"],
        Language::Ruby => &["binary"],
        Language::Bash => &["list"],
        _ => &["binary_expression"],
    }
}

/// Single-line comment prefix used by the SATD comment gate.
pub fn line_comment_prefixes(language: Language) -> &'static [&'static str] {
    match language {
        Language::Python | Language::Ruby | Language::Bash => &["#"],
        Language::Php => &["//", "#"],
        Language::Unknown => &["//", "#"],
        _ => &["//"],
    }
}

/// Call names that unconditionally terminate control flow, in addition to
/// `return`/`throw`/`raise` statements.
pub fn terminator_calls(language: Language) -> &'static [&'static str] {
    match language {
        Language::Go => &["panic", "os.Exit", "log.Fatal", "log.Fatalf"],
        Language::Rust => &[
            "panic!",
            "unreachable!",
            "todo!",
            "unimplemented!",
            "std::process::exit",
            "process::exit",
        ],
        Language::Python => &["sys.exit", "os._exit"],
        Language::TypeScript | Language::Tsx | Language::JavaScript => &["process.exit"],
        Language::Java => &["System.exit"],
        Language::C | Language::Cpp => &["exit", "abort", "_Exit"],
        Language::CSharp => &["Environment.Exit"],
        Language::Ruby => &["exit", "abort"],
        Language::Php => &["exit", "die"],
        Language::Bash => &["exit"],
        Language::Unknown => &[],
    }
}

/// Statement kinds that terminate control flow outright.
pub fn terminator_statements(language: Language) -> &'static [&'static str] {
    match language {
        Language::Go => &["return_statement"],
        Language::Rust => &["return_expression"],
        Language::Python => &["return_statement", "raise_statement"],
        Language::TypeScript | Language::Tsx | Language::JavaScript => {
            &["return_statement", "throw_statement"]
        }
        Language::Java => &["return_statement", "throw_statement"],
        Language::C | Language::Cpp => &["return_statement"],
        Language::CSharp => &["return_statement", "throw_statement"],
        Language::Ruby => &["return"],
        Language::Php => &["return_statement", "throw_expression"],
        Language::Bash => &["return_statement"],
        Language::Unknown => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_tables_cover_switch_variants() {
        let decisions = decision_types(Language::Go);
        assert!(decisions.contains(&"expression_switch_statement"));
        assert!(decisions.contains(&"type_switch_statement"));
        assert!(decisions.contains(&"select_statement"));
    }

    #[test]
    fn test_rust_match_counts_per_arm() {
        assert!(decision_types(Language::Rust).contains(&"match_expression"));
        assert!(decision_types(Language::Rust).contains(&"match_arm"));
    }

    #[test]
    fn test_unknown_language_has_empty_tables() {
        assert!(decision_types(Language::Unknown).is_empty());
        assert!(function_types(Language::Unknown).is_empty());
        assert!(nesting_types(Language::Unknown).is_empty());
    }

    #[test]
    fn test_python_logical_operators_are_words() {
        assert_eq!(logical_operators(Language::Python), &["and", "or"]);
        assert_eq!(
            binary_expression_types(Language::Python),
            &["boolean_operator"]
        );
    }

    #[test]
    fn test_nesting_includes_blocks() {
        assert!(nesting_types(Language::Go).contains(&"block"));
        assert!(nesting_types(Language::C).contains(&"compound_statement"));
    }
}
