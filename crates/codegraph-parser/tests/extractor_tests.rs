use codegraph_core::{EdgeKind, ExtractionContext, NodeKind};
use codegraph_parser::extract_file;

fn ctx(file_path: &str) -> ExtractionContext {
    ExtractionContext {
        file_path: file_path.to_string(),
        package: "root".to_string(),
    }
}

#[test]
fn extracts_file_node_and_function_node() {
    let source = "export function formatDate(d: Date): string {\n  return d.toISOString();\n}\n";
    let extraction = extract_file(&ctx("src/util.ts"), source).unwrap();

    let file_node = extraction.nodes.iter().find(|n| n.kind == NodeKind::File);
    assert!(file_node.is_some());

    let func = extraction
        .nodes
        .iter()
        .find(|n| n.kind == NodeKind::Function && n.name == "formatDate")
        .expect("function node should be extracted");
    assert!(func.exported);
    assert!(func.content_hash.is_some());
}

#[test]
fn content_hash_is_stable_for_identical_source() {
    let source = "export function foo() { return 1; }\n";
    let a = extract_file(&ctx("src/a.ts"), source).unwrap();
    let b = extract_file(&ctx("src/a.ts"), source).unwrap();

    let hash_a = a.nodes.iter().find(|n| n.name == "foo").unwrap().content_hash.clone();
    let hash_b = b.nodes.iter().find(|n| n.name == "foo").unwrap().content_hash.clone();
    assert_eq!(hash_a, hash_b);
}

#[test]
fn direct_call_produces_calls_edge_with_call_site() {
    let source = "function A() { B(); }\nfunction B() {}\n";
    let extraction = extract_file(&ctx("a.ts"), source).unwrap();

    let call = extraction
        .edges
        .iter()
        .find(|e| e.kind == EdgeKind::Calls)
        .expect("a CALLS edge should be emitted");
    assert_eq!(call.call_count, Some(1));
    assert!(call.call_sites.as_ref().unwrap()[0].start_line >= 1);
}

#[test]
fn repeated_calls_collapse_into_one_edge_with_call_count() {
    let source = "function A() { B(); B(); B(); }\nfunction B() {}\n";
    let extraction = extract_file(&ctx("a.ts"), source).unwrap();

    let calls: Vec<_> = extraction.edges.iter().filter(|e| e.kind == EdgeKind::Calls).collect();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].call_count, Some(3));
    assert_eq!(calls[0].call_sites.as_ref().unwrap().len(), 3);
}

#[test]
fn call_through_local_alias_targets_the_underlying_function() {
    let source = "const fn = target;\nexport function caller() { return fn(); }\nfunction target() {}\n";
    let extraction = extract_file(&ctx("caller.ts"), source).unwrap();

    let call = extraction
        .edges
        .iter()
        .find(|e| e.kind == EdgeKind::Calls)
        .expect("a CALLS edge should be emitted");
    assert!(call.target_id.ends_with("target") || call.target_id.contains(":target"));
    assert!(!call.target_id.contains(":fn"));
}

#[test]
fn class_emits_methods_and_extends_edge() {
    let source = "class Base {}\nclass Derived extends Base {\n  run(): void {}\n}\n";
    let extraction = extract_file(&ctx("m.ts"), source).unwrap();

    let derived = extraction
        .nodes
        .iter()
        .find(|n| n.kind == NodeKind::Class && n.name == "Derived")
        .unwrap();
    assert_eq!(derived.properties.extends.as_deref(), Some("Base"));

    let method = extraction
        .nodes
        .iter()
        .find(|n| n.kind == NodeKind::Method && n.name == "run")
        .expect("method node should be extracted");
    assert!(method.id.contains("Derived.run"));

    assert!(extraction.edges.iter().any(|e| e.kind == EdgeKind::Extends));
}

#[test]
fn type_alias_of_return_type_emits_synthetic_alias_edge() {
    let source = "export function createService() { return { fetchAll() {} }; }\ntype Service = ReturnType<typeof createService>;\n";
    let extraction = extract_file(&ctx("service.ts"), source).unwrap();

    let alias_edge = extraction
        .edges
        .iter()
        .find(|e| e.kind == EdgeKind::AliasFor)
        .expect("ALIAS_FOR edge should be emitted");
    let synthetic = extraction
        .nodes
        .iter()
        .find(|n| n.id == alias_edge.target_id)
        .expect("synthetic type node should exist");
    assert_eq!(synthetic.kind, NodeKind::SyntheticType);
    assert!(synthetic.name.starts_with("ReturnType<"));
}

#[test]
fn import_is_skipped_for_external_packages() {
    let source = "import { z } from 'zod';\n";
    let extraction = extract_file(&ctx("a.ts"), source).unwrap();
    assert!(extraction.edges.iter().all(|e| e.kind != EdgeKind::Imports));
}

#[test]
fn relative_import_produces_imports_edge_with_symbols() {
    let source = "import { helper } from './util';\n";
    let extraction = extract_file(&ctx("src/a.ts"), source).unwrap();

    let import = extraction
        .edges
        .iter()
        .find(|e| e.kind == EdgeKind::Imports)
        .expect("IMPORTS edge should be emitted");
    assert_eq!(import.target_id, "src/util.ts");
    assert_eq!(import.imported_symbols.as_deref(), Some(&["helper".to_string()][..]));
}

#[test]
fn interface_property_with_named_type_emits_property_node_and_has_property_edge() {
    let source = "interface Order {\n  customer: Customer;\n  total: number;\n}\n";
    let extraction = extract_file(&ctx("order.ts"), source).unwrap();

    let property = extraction
        .nodes
        .iter()
        .find(|n| n.kind == NodeKind::Property && n.name == "customer")
        .expect("a Property node should be emitted for the named-type field");
    assert!(extraction
        .nodes
        .iter()
        .all(|n| !(n.kind == NodeKind::Property && n.name == "total")));

    let interface = extraction
        .nodes
        .iter()
        .find(|n| n.kind == NodeKind::Interface && n.name == "Order")
        .unwrap();
    assert!(extraction
        .edges
        .iter()
        .any(|e| e.kind == EdgeKind::Contains && e.source_id == interface.id && e.target_id == property.id));
    assert!(extraction.edges.iter().any(|e| e.kind == EdgeKind::HasProperty
        && e.source_id == interface.id
        && e.target_id.contains("Customer")));
}

#[test]
fn class_field_with_named_type_emits_property_node() {
    let source = "class Cart {\n  owner: Customer;\n  readonly id: string;\n}\n";
    let extraction = extract_file(&ctx("cart.ts"), source).unwrap();

    assert!(extraction
        .nodes
        .iter()
        .any(|n| n.kind == NodeKind::Property && n.name == "owner"));
    assert!(extraction
        .nodes
        .iter()
        .all(|n| !(n.kind == NodeKind::Property && n.name == "id")));
}

#[test]
fn variable_with_named_type_emits_has_type_edge() {
    let source = "const current: Customer = load();\n";
    let extraction = extract_file(&ctx("state.ts"), source).unwrap();

    let variable = extraction
        .nodes
        .iter()
        .find(|n| n.kind == NodeKind::Variable && n.name == "current")
        .expect("variable node should be extracted");
    assert!(extraction.edges.iter().any(|e| e.kind == EdgeKind::HasType
        && e.source_id == variable.id
        && e.target_id.contains("Customer")));
}

#[test]
fn function_parameter_with_named_type_emits_uses_type_edge() {
    let source = "function place(order: Order): void {}\n";
    let extraction = extract_file(&ctx("place.ts"), source).unwrap();

    let func = extraction
        .nodes
        .iter()
        .find(|n| n.kind == NodeKind::Function && n.name == "place")
        .unwrap();
    assert!(extraction.edges.iter().any(|e| e.kind == EdgeKind::UsesType
        && e.source_id == func.id
        && e.target_id.contains("Order")));
}
