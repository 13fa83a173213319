//! Per-file symbol extraction.
//!
//! Produces the raw facts the dead-code engine and graph builders aggregate:
//! definitions with visibility and FFI flags, textual call references with
//! receiver hints, imports, interface-implementation hints, identifier
//! usages, and unreachable statement spans. Extraction is per-file and
//! thread-local; nothing here touches shared state.

use tree_sitter::Node;

use crate::models::symbols::{
    CallReference, Definition, DefinitionKind, FileSymbols, ImplHint, ReferenceType,
    UnreachableSpan, Visibility,
};
use crate::models::syntax::{Language, ParsedFile};
use crate::services::language::{
    call_types, class_types, function_types, import_types, terminator_calls,
    terminator_statements, variable_types,
};
use crate::services::satd_detector::is_test_file;

pub struct SymbolExtractor;

impl SymbolExtractor {
    pub fn extract(parsed: &ParsedFile) -> FileSymbols {
        let file = parsed.path.to_string_lossy().to_string();
        let language = parsed.language;
        let in_test_file = is_test_file(&parsed.path);

        let mut symbols = FileSymbols {
            file: file.clone(),
            module: module_name(parsed),
            ..Default::default()
        };

        collect_identifiers(parsed, &mut symbols);
        collect_imports(parsed, &mut symbols);
        collect_impl_hints(parsed, &mut symbols);

        // Definitions and the calls attributed to them.
        crate::services::parser::visit_nodes(parsed.root(), &mut |node| {
            let kind = node.kind();
            if function_types(language).contains(&kind) {
                let def = build_function_definition(parsed, node, &file, in_test_file);
                collect_calls(parsed, node, &def.name, &mut symbols.calls);
                collect_unreachable(parsed, node, &file, &mut symbols.unreachable);
                symbols.definitions.push(def);
                // Calls inside this function were attributed above; do not
                // revisit the subtree at file scope.
                return false;
            }
            if class_types(language).contains(&kind) {
                if let Some(def) = build_class_definition(parsed, node, &file, in_test_file) {
                    symbols.definitions.push(def);
                }
                return true;
            }
            if variable_types(language).contains(&kind) && is_top_level(node, language) {
                build_variable_definitions(parsed, node, &file, in_test_file, &mut symbols.definitions);
                return true;
            }
            if call_types(language).contains(&kind) {
                // File-scope call: attributed to the synthetic empty caller.
                if let Some(call) = build_call(parsed, node, "") {
                    symbols.calls.push(call);
                }
            }
            true
        });

        symbols
    }
}

fn module_name(parsed: &ParsedFile) -> Option<String> {
    match parsed.language {
        Language::Go => {
            let mut name = None;
            crate::services::parser::visit_typed(parsed.root(), &mut |kind, node| {
                if kind == "package_clause" {
                    for i in 0..node.child_count() {
                        if let Some(child) = node.child(i) {
                            if child.kind() == "package_identifier" {
                                name = Some(parsed.node_text(child).to_string());
                            }
                        }
                    }
                    return false;
                }
                name.is_none()
            });
            name
        }
        Language::Java => {
            let mut name = None;
            crate::services::parser::visit_typed(parsed.root(), &mut |kind, node| {
                if kind == "package_declaration" {
                    name = node
                        .named_child(0)
                        .map(|n| parsed.node_text(n).to_string());
                    return false;
                }
                name.is_none()
            });
            name
        }
        _ => parsed
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string()),
    }
}

fn identity_hash(file: &str, name: &str, kind: DefinitionKind, start_line: u32) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(file.as_bytes());
    hasher.update(name.as_bytes());
    hasher.update(format!("{kind:?}").as_bytes());
    hasher.update(&start_line.to_le_bytes());
    hasher.finalize().to_hex()[..16].to_string()
}

fn node_name(parsed: &ParsedFile, node: Node<'_>) -> Option<String> {
    node.child_by_field_name("name")
        .map(|n| parsed.node_text(n).to_string())
        .filter(|n| !n.is_empty())
}

fn build_function_definition(
    parsed: &ParsedFile,
    node: Node<'_>,
    file: &str,
    in_test_file: bool,
) -> Definition {
    let name = node_name(parsed, node).unwrap_or_else(|| "<anonymous>".to_string());
    let receiver = receiver_type(parsed, node);
    let kind = if receiver.is_some() {
        DefinitionKind::Method
    } else {
        DefinitionKind::Function
    };
    let (visibility, exported) = visibility_of(parsed, node, &name);
    let start_line = ParsedFile::start_line(node);

    Definition {
        identity: identity_hash(file, &name, kind, start_line),
        ffi_exported: is_ffi_exported(parsed, node),
        end_line: ParsedFile::end_line(node),
        receiver,
        file: file.to_string(),
        start_line,
        visibility,
        exported,
        in_test_file,
        node_id: 0,
        name,
        kind,
    }
}

fn build_class_definition(
    parsed: &ParsedFile,
    node: Node<'_>,
    file: &str,
    in_test_file: bool,
) -> Option<Definition> {
    // Go wraps the named spec inside type_declaration.
    let named = if node.kind() == "type_declaration" {
        (0..node.child_count())
            .filter_map(|i| node.child(i))
            .find(|c| c.kind() == "type_spec")?
    } else {
        node
    };
    let name = node_name(parsed, named)?;
    let (visibility, exported) = visibility_of(parsed, node, &name);
    let start_line = ParsedFile::start_line(node);

    Some(Definition {
        identity: identity_hash(file, &name, DefinitionKind::Class, start_line),
        ffi_exported: is_ffi_exported(parsed, node),
        end_line: ParsedFile::end_line(node),
        receiver: None,
        file: file.to_string(),
        start_line,
        visibility,
        exported,
        in_test_file,
        node_id: 0,
        name,
        kind: DefinitionKind::Class,
    })
}

fn build_variable_definitions(
    parsed: &ParsedFile,
    node: Node<'_>,
    file: &str,
    in_test_file: bool,
    out: &mut Vec<Definition>,
) {
    let mut push = |name: String, decl: Node<'_>| {
        if name.is_empty() || name == "_" {
            return;
        }
        let (visibility, exported) = visibility_of(parsed, decl, &name);
        let start_line = ParsedFile::start_line(decl);
        out.push(Definition {
            identity: identity_hash(file, &name, DefinitionKind::Variable, start_line),
            ffi_exported: false,
            end_line: ParsedFile::end_line(decl),
            receiver: None,
            file: file.to_string(),
            start_line,
            visibility,
            exported,
            in_test_file,
            node_id: 0,
            name,
            kind: DefinitionKind::Variable,
        });
    };

    match node.kind() {
        // Go groups specs under one declaration.
        "var_declaration" | "const_declaration" => {
            crate::services::parser::visit_typed(node, &mut |kind, spec| {
                if kind == "var_spec" || kind == "const_spec" {
                    for i in 0..spec.child_count() {
                        if let Some(child) = spec.child(i) {
                            if child.kind() == "identifier" {
                                push(parsed.node_text(child).to_string(), spec);
                            }
                        }
                    }
                    return false;
                }
                true
            });
        }
        "assignment" => {
            if let Some(left) = node.child_by_field_name("left") {
                if left.kind() == "identifier" {
                    push(parsed.node_text(left).to_string(), node);
                }
            }
        }
        "variable_declaration" | "lexical_declaration" => {
            crate::services::parser::visit_typed(node, &mut |kind, declarator| {
                if kind == "variable_declarator" {
                    if let Some(name) = declarator.child_by_field_name("name") {
                        push(parsed.node_text(name).to_string(), declarator);
                    }
                    return false;
                }
                true
            });
        }
        _ => {
            if let Some(name) = node_name(parsed, node) {
                push(name, node);
            }
        }
    }
}

/// Receiver type for methods: Go receiver lists, Rust `impl` blocks, and
/// class-shaped ancestors elsewhere.
fn receiver_type(parsed: &ParsedFile, node: Node<'_>) -> Option<String> {
    let language = parsed.language;
    match language {
        Language::Go => {
            let receiver = node.child_by_field_name("receiver")?;
            let text = parsed.node_text(receiver);
            let inner = text.trim_start_matches('(').trim_end_matches(')');
            inner
                .split_whitespace()
                .last()
                .map(|t| t.trim_start_matches('*').to_string())
        }
        Language::Rust => {
            let mut current = node.parent();
            while let Some(parent) = current {
                if parent.kind() == "impl_item" {
                    return parent
                        .child_by_field_name("type")
                        .map(|t| parsed.node_text(t).to_string());
                }
                current = parent.parent();
            }
            None
        }
        _ => {
            let class_kinds = class_types(language);
            let mut current = node.parent();
            while let Some(parent) = current {
                if class_kinds.contains(&parent.kind()) {
                    return node_name(parsed, parent);
                }
                current = parent.parent();
            }
            None
        }
    }
}

fn visibility_of(parsed: &ParsedFile, node: Node<'_>, name: &str) -> (Visibility, bool) {
    match parsed.language {
        Language::Go => {
            let public = name.chars().next().is_some_and(|c| c.is_uppercase());
            if public {
                (Visibility::Public, true)
            } else {
                (Visibility::Private, false)
            }
        }
        Language::Python => {
            if name.starts_with('_') {
                (Visibility::Private, false)
            } else {
                (Visibility::Public, true)
            }
        }
        Language::Rust => {
            let public = (0..node.child_count())
                .filter_map(|i| node.child(i))
                .any(|c| c.kind() == "visibility_modifier");
            if public {
                (Visibility::Public, true)
            } else {
                (Visibility::Private, false)
            }
        }
        Language::Java | Language::CSharp => {
            let text = parsed.node_text(node);
            let head: String = text.chars().take(120).collect();
            if head.contains("public") {
                (Visibility::Public, true)
            } else if head.contains("private") {
                (Visibility::Private, false)
            } else {
                (Visibility::Internal, false)
            }
        }
        Language::TypeScript | Language::Tsx | Language::JavaScript => {
            let mut current = node.parent();
            while let Some(parent) = current {
                if parent.kind() == "export_statement" {
                    return (Visibility::Public, true);
                }
                current = parent.parent();
            }
            (Visibility::Internal, false)
        }
        _ => (Visibility::Unknown, false),
    }
}

/// Language-specific FFI export detection windows.
fn is_ffi_exported(parsed: &ParsedFile, node: Node<'_>) -> bool {
    let start = node.start_byte();
    // The window is bounded below by the nearest paragraph break so one
    // definition's attributes never bleed into the next.
    let window = |len: usize| {
        let from = start.saturating_sub(len);
        let raw = parsed.source.get(from..start).unwrap_or("");
        raw.rsplit("\n\n").next().unwrap_or(raw)
    };

    match parsed.language {
        Language::Go => {
            let w = window(200);
            w.contains("//export") || w.contains("//go:linkname")
        }
        Language::Rust => {
            let w = window(200);
            w.contains("#[no_mangle]")
                || w.contains("#[export_name")
                || parsed.node_text(node).starts_with("extern \"C\"")
                || w.contains("extern \"C\"")
        }
        Language::C | Language::Cpp => {
            let text = parsed.node_text(node);
            let head: String = text.chars().take(400).collect();
            head.contains("__declspec(dllexport)")
                || head.contains("__attribute__((visibility")
                || head.contains("extern \"C\"")
        }
        Language::Python => {
            let w = window(500);
            w.contains("@pyfunction")
                || w.contains("@pyclass")
                || w.contains("@pymethods")
                || w.contains("@ffi.def_extern")
                || w.contains("CFUNCTYPE")
        }
        _ => false,
    }
}

/// A declaration is top-level when no enclosing function owns it; class
/// fields still qualify.
fn is_top_level(node: Node<'_>, language: Language) -> bool {
    let fn_kinds = function_types(language);
    let mut current = node.parent();
    while let Some(parent) = current {
        if fn_kinds.contains(&parent.kind()) {
            return false;
        }
        current = parent.parent();
    }
    true
}

fn collect_identifiers(parsed: &ParsedFile, symbols: &mut FileSymbols) {
    crate::services::parser::visit_nodes(parsed.root(), &mut |node| {
        if node.child_count() == 0 && node.is_named() && node.kind().ends_with("identifier") {
            *symbols
                .identifiers
                .entry(parsed.node_text(node).to_string())
                .or_insert(0) += 1;
        }
        true
    });
}

fn collect_imports(parsed: &ParsedFile, symbols: &mut FileSymbols) {
    let import_kinds = import_types(parsed.language);
    if import_kinds.is_empty() {
        return;
    }
    crate::services::parser::visit_typed(parsed.root(), &mut |kind, node| {
        if import_kinds.contains(&kind) {
            let text = parsed.node_text(node);
            let cleaned = clean_import(text, parsed.language);
            if !cleaned.is_empty() {
                symbols.imports.push(cleaned);
            }
            return false;
        }
        true
    });
}

fn clean_import(text: &str, language: Language) -> String {
    match language {
        Language::Go => text.trim().trim_matches('"').to_string(),
        Language::Rust => text
            .trim()
            .trim_start_matches("pub ")
            .trim_start_matches("use ")
            .trim_end_matches(';')
            .to_string(),
        Language::Python => text
            .trim()
            .trim_start_matches("from ")
            .trim_start_matches("import ")
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_string(),
        Language::TypeScript | Language::Tsx | Language::JavaScript => text
            .rsplit(&['\'', '"'][..])
            .nth(1)
            .unwrap_or("")
            .to_string(),
        Language::Java | Language::CSharp => text
            .trim()
            .trim_start_matches("import ")
            .trim_start_matches("using ")
            .trim_end_matches(';')
            .trim()
            .to_string(),
        Language::C | Language::Cpp => text
            .trim()
            .trim_start_matches("#include")
            .trim()
            .trim_matches(&['"', '<', '>'][..])
            .to_string(),
        _ => text.trim().to_string(),
    }
}

fn collect_impl_hints(parsed: &ParsedFile, symbols: &mut FileSymbols) {
    let class_kinds = class_types(parsed.language);
    crate::services::parser::visit_typed(parsed.root(), &mut |kind, node| {
        if !class_kinds.contains(&kind) {
            return true;
        }
        let Some(implementor) = node_name(parsed, node) else {
            return true;
        };
        // implements/heritage clauses carry explicit interface names.
        crate::services::parser::visit_typed(node, &mut |inner_kind, inner| {
            match inner_kind {
                "super_interfaces" | "implements_clause" | "base_list" => {
                    crate::services::parser::visit_nodes(inner, &mut |leaf| {
                        if leaf.child_count() == 0 && leaf.kind().ends_with("identifier") {
                            symbols.impl_hints.push(ImplHint {
                                interface: parsed.node_text(leaf).to_string(),
                                implementor: implementor.clone(),
                            });
                        }
                        true
                    });
                    false
                }
                _ => true,
            }
        });
        true
    });
}

/// Record calls inside one function body, attributed to `caller`.
fn collect_calls(
    parsed: &ParsedFile,
    function: Node<'_>,
    caller: &str,
    out: &mut Vec<CallReference>,
) {
    let call_kinds = call_types(parsed.language);
    let fn_kinds = function_types(parsed.language);
    let body = function.child_by_field_name("body").unwrap_or(function);

    crate::services::parser::visit_nodes(body, &mut |node| {
        let kind = node.kind();
        if fn_kinds.contains(&kind) && node.id() != function.id() {
            return false;
        }
        if call_kinds.contains(&kind) {
            if let Some(call) = build_call(parsed, node, caller) {
                out.push(call);
            }
        }
        true
    });
}

/// Extract the callee name and an optional receiver hint from a call node.
fn build_call(parsed: &ParsedFile, node: Node<'_>, caller: &str) -> Option<CallReference> {
    let file = parsed.path.to_string_lossy().to_string();
    let line = ParsedFile::start_line(node);

    let target = node
        .child_by_field_name("function")
        .or_else(|| node.child_by_field_name("name"))
        .or_else(|| node.child_by_field_name("constructor"))
        .or_else(|| node.named_child(0))?;

    let (callee, receiver, reference_type) = match target.kind() {
        // Method calls through a receiver resolve via dynamic dispatch.
        "selector_expression" | "field_expression" | "attribute" | "member_expression" => {
            let method = target
                .child_by_field_name("field")
                .or_else(|| target.child_by_field_name("attribute"))
                .or_else(|| target.child_by_field_name("property"))
                .or_else(|| target.named_child(1))?;
            let object = target
                .child_by_field_name("operand")
                .or_else(|| target.child_by_field_name("object"))
                .or_else(|| target.child_by_field_name("value"))
                .or_else(|| target.named_child(0));
            (
                parsed.node_text(method).to_string(),
                object.map(|o| parsed.node_text(o).to_string()),
                ReferenceType::DynamicDispatch,
            )
        }
        "scoped_identifier" => {
            let name = target
                .child_by_field_name("name")
                .map(|n| parsed.node_text(n).to_string())
                .unwrap_or_else(|| parsed.node_text(target).to_string());
            (name, None, ReferenceType::DirectCall)
        }
        _ => {
            let mut text = parsed.node_text(target).to_string();
            // Java method_invocation exposes name/object as fields on the
            // call node itself.
            if let Some(object) = node.child_by_field_name("object") {
                let object_text = parsed.node_text(object).to_string();
                return Some(CallReference {
                    caller: caller.to_string(),
                    callee: text,
                    receiver: Some(object_text),
                    file,
                    line,
                    reference_type: ReferenceType::DynamicDispatch,
                });
            }
            text.truncate(text.find('!').unwrap_or(text.len()));
            (text, None, ReferenceType::DirectCall)
        }
    };

    if callee.is_empty() {
        return None;
    }

    Some(CallReference {
        caller: caller.to_string(),
        callee,
        receiver,
        file,
        line,
        reference_type,
    })
}

/// Statements following an unconditional terminator inside a function body.
/// Adjacent unreachable statements merge into a single block.
fn collect_unreachable(
    parsed: &ParsedFile,
    function: Node<'_>,
    file: &str,
    out: &mut Vec<UnreachableSpan>,
) {
    let Some(body) = function.child_by_field_name("body") else {
        return;
    };
    let language = parsed.language;
    let terminators = terminator_statements(language);
    let exit_calls = terminator_calls(language);

    let mut terminated_by: Option<&'static str> = None;
    let mut span: Option<(u32, u32)> = None;

    for i in 0..body.named_child_count() {
        let Some(statement) = body.named_child(i) else {
            continue;
        };
        if statement.kind() == "comment" {
            continue;
        }

        if terminated_by.is_some() {
            let start = ParsedFile::start_line(statement);
            let end = ParsedFile::end_line(statement);
            span = Some(match span {
                None => (start, end),
                Some((s, _)) => (s, end),
            });
            continue;
        }

        if terminators.contains(&statement.kind()) {
            terminated_by = Some(statement.kind());
        } else if is_exit_call(parsed, statement, exit_calls) {
            terminated_by = Some("terminating call");
        }
    }

    if let (Some(reason), Some((start_line, end_line))) = (terminated_by, span) {
        out.push(UnreachableSpan {
            file: file.to_string(),
            start_line,
            end_line,
            reason: format!("unreachable after {reason}"),
        });
    }
}

fn is_exit_call(parsed: &ParsedFile, statement: Node<'_>, exit_calls: &[&str]) -> bool {
    let text = parsed.node_text(statement);
    let head = text.lines().next().unwrap_or("");
    exit_calls.iter().any(|call| {
        head.strip_prefix(call).is_some_and(|rest| {
            rest.is_empty() || rest.starts_with('(') || rest.starts_with(char::is_whitespace)
        })
    })
}
