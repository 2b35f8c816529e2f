use std::sync::Arc;

use pretty_assertions::assert_eq;
use trellis_convert::{ConfigError, ConversionConfig, ConversionService, TypeDescriptor, Value};
use trellis_types::{ClassId, Erasure, MethodParameter, ParameterIndex, TypeNode, TypeStore};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn descriptor(store: &Arc<TypeStore>, text: &str) -> TypeDescriptor {
    let node = TypeNode::for_expr(store, store.parse_type(text).unwrap());
    TypeDescriptor::from_node(store, node)
}

#[test]
fn comma_joined_strings_round_trip_through_integer_arrays() {
    init_tracing();
    let store = Arc::new(TypeStore::with_minimal_jdk());
    let service = ConversionService::with_defaults(store.clone()).unwrap();
    let integer = Erasure::of(store.well_known().integer);

    let array = service
        .convert_to(Some(&Value::string("1,2,3")), integer.array())
        .unwrap()
        .unwrap();
    assert_eq!(
        array,
        Value::Array {
            component: integer,
            elements: vec![Some(Value::Int(1)), Some(Value::Int(2)), Some(Value::Int(3))],
        }
    );

    let text = service
        .convert_to(Some(&array), Erasure::of(store.well_known().string))
        .unwrap();
    assert_eq!(text, Some(Value::string("1,2,3")));
}

#[test]
fn every_type_converts_to_itself_without_converters() {
    let store = Arc::new(TypeStore::with_minimal_jdk());
    let service = ConversionService::new(store.clone());

    for (id, _) in store.classes() {
        let erasure = Erasure::of(id);
        assert!(service.can_convert_erasures(erasure, erasure), "{}", store.erasure_name(erasure));
        assert!(service.can_convert_erasures(erasure.array(), erasure.array()));
    }
}

struct Binding {
    store: Arc<TypeStore>,
    settings: ClassId,
    level: ClassId,
}

fn binding() -> Binding {
    let mut store = TypeStore::with_minimal_jdk();
    let level = store
        .class_builder("com.example.Level")
        .enumeration(&["DEBUG", "INFO", "WARN"])
        .build()
        .unwrap();
    let settings = store
        .class_builder("com.example.Settings")
        .field("levels", "java.util.Set<com.example.Level>")
        .field("ports", "int[]")
        .method("retry", &[("attempts", "java.util.List<Integer>")], None)
        .build()
        .unwrap();
    Binding {
        store: Arc::new(store),
        settings,
        level,
    }
}

#[test]
fn binds_strings_to_declared_field_and_parameter_types() {
    init_tracing();
    let Binding {
        store,
        settings,
        level,
    } = binding();
    let service = ConversionService::with_defaults(store.clone()).unwrap();
    let wk = store.well_known().clone();

    let levels = TypeDescriptor::for_field(&store, settings, "levels").unwrap();
    let enum_value = |constant: &str| {
        Some(Value::Enum {
            class: level,
            constant: constant.to_string(),
        })
    };
    assert_eq!(
        service
            .convert(Some(&Value::string("WARN, INFO, WARN")), &levels)
            .unwrap(),
        Some(Value::Collection {
            class: wk.linked_hash_set,
            elements: vec![enum_value("WARN"), enum_value("INFO")],
        })
    );
    assert!(service
        .convert(Some(&Value::string("WARN,LOUD")), &levels)
        .is_err());

    let ports = TypeDescriptor::for_field(&store, settings, "ports").unwrap();
    assert_eq!(
        service.convert(Some(&Value::string("80,443")), &ports).unwrap(),
        Some(Value::Array {
            component: Erasure::of(wk.prim_int),
            elements: vec![Some(Value::Int(80)), Some(Value::Int(443))],
        })
    );

    let attempts = TypeDescriptor::for_method_parameter(
        &store,
        &MethodParameter::new(settings, "retry", ParameterIndex::Param(0)),
    )
    .unwrap();
    assert_eq!(
        service
            .convert(Some(&Value::string("1,2")), &attempts)
            .unwrap()
            .and_then(|value| value.elements().map(<[_]>::to_vec)),
        Some(vec![Some(Value::Int(1)), Some(Value::Int(2))])
    );
}

#[test]
fn element_conversion_checks_recurse_into_the_service() {
    let Binding { store, .. } = binding();
    let service = ConversionService::with_defaults(store.clone()).unwrap();
    let string = descriptor(&store, "String");

    assert!(service.can_convert(Some(&string), &descriptor(&store, "java.util.List<Long>")));
    assert!(service.can_convert(
        Some(&descriptor(&store, "Integer[]")),
        &descriptor(&store, "java.util.Set<Double>")
    ));
    // No converter reaches a map element.
    assert!(!service.can_convert(
        Some(&string),
        &descriptor(&store, "java.util.List<java.util.Map<String, String>>")
    ));
}

#[test]
fn config_files_shape_the_service() {
    let path = std::env::temp_dir().join(format!("trellis-convert-{}.toml", std::process::id()));
    std::fs::write(&path, "register_defaults = false\nelement_delimiter = \"|\"\n").unwrap();
    let config = ConversionConfig::load_from_path(&path);
    let _ = std::fs::remove_file(&path);
    let config = config.unwrap();
    assert_eq!(config.element_delimiter, "|");

    let store = Arc::new(TypeStore::with_minimal_jdk());
    let wk = store.well_known().clone();
    let service = ConversionService::from_config(store, config).unwrap();
    assert!(!service.can_convert_erasures(Erasure::of(wk.string), Erasure::of(wk.integer)));
    assert!(service.can_convert_erasures(Erasure::of(wk.prim_int), Erasure::of(wk.number)));
    assert_eq!(service.converters().pair_count(), 0);

    let err = ConversionConfig::from_toml_str("register_defaults = \"yes\"").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err:?}");
}
