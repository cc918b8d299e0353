//! Packed records seen through the `ValueSource` contract.

use std::sync::Arc;

use dbal::{DbalError, IdDomain, TypeTag, Value, ValueSource};
use dbconnector_pg::pg_type::{self, BOOL, FLOAT8, INT4, INT8, TEXT};
use dbconnector_pg::{
    ConnectorConfig, Datum, DescriptorResolver, PackedRecord, RecordSource, TupleDescriptor,
    TypeCache, form_record, varlena,
};

const CONFIG: &str = r#"
    [[types]]
    name = "sample"
    oid = 16500
    fields = [
        { name = "id", type = "int8" },
        { name = "weight", type = "float8" },
        { name = "label", type = "text" },
        { name = "active", type = "bool" },
    ]

    [[types]]
    name = "tagged_sample"
    oid = 16501
    fields = [
        { name = "tag", type = "int4" },
        { name = "sample", type = "sample" },
    ]
"#;

fn cache() -> TypeCache {
    TypeCache::from_config(&ConnectorConfig::parse(CONFIG).unwrap()).unwrap()
}

fn sample_desc(cache: &TypeCache) -> Arc<TupleDescriptor> {
    cache.lookup_rowtype(TypeTag(16500), -1).unwrap()
}

#[test]
fn four_fields_with_the_second_null() {
    let cache = cache();
    let label = varlena::pack_str("north");
    let record = form_record(
        &sample_desc(&cache),
        &[Datum::from_i64(42), Datum::Word(0), Datum::Ref(&label), Datum::from_bool(true)],
        &[false, true, false, false],
    )
    .unwrap();
    let source = RecordSource::new(&record, &cache).unwrap();

    let v = source.get_value_by_id(2).unwrap();
    assert!(v.is_null());
    assert_eq!(v.type_tag(), FLOAT8);

    assert_eq!(
        source.get_value_by_id(0),
        Err(DbalError::InvalidIdentifier {
            id: 0,
            domain: IdDomain::Field { count: 4 },
        })
    );
    assert!(matches!(
        source.get_value_by_id(5),
        Err(DbalError::InvalidIdentifier { id: 5, .. })
    ));

    assert_eq!(source.get_value_by_id(1).unwrap().as_i64(), Some(42));
    assert_eq!(source.get_value_by_id(3).unwrap().as_str(), Some("north"));
    assert_eq!(source.get_value_by_id(4).unwrap().as_bool(), Some(true));
}

#[test]
fn null_bits_are_respected_for_every_field() {
    let cache = cache();
    let desc = sample_desc(&cache);
    let label = varlena::pack_str("x");
    let values = [Datum::from_i64(1), Datum::from_f64(0.5), Datum::Ref(&label), Datum::from_bool(false)];

    for mask in 0u8..16 {
        let nulls: Vec<bool> = (0..4).map(|i| mask & (1 << i) != 0).collect();
        let record = form_record(&desc, &values, &nulls).unwrap();
        let source = RecordSource::new(&record, &cache).unwrap();
        for f in 1..=4u32 {
            let v = source.get_value_by_id(f).unwrap();
            assert_eq!(v.is_null(), nulls[f as usize - 1], "mask {mask:04b}, field {f}");
            assert_eq!(v.type_tag(), desc.attr(f).unwrap().type_tag);
        }
    }
}

#[test]
fn clone_answers_like_the_original_and_drops_independently() {
    let cache = cache();
    let label = varlena::pack_str("south");
    let record = form_record(
        &sample_desc(&cache),
        &[Datum::from_i64(-7), Datum::from_f64(9.75), Datum::Ref(&label), Datum::Word(0)],
        &[false, false, false, true],
    )
    .unwrap();
    let original: Box<dyn ValueSource<'_> + '_> = Box::new(RecordSource::new(&record, &cache).unwrap());
    let copy = original.clone();

    for id in 0..=5 {
        assert_eq!(copy.get_value_by_id(id), original.get_value_by_id(id), "field {id}");
    }

    drop(copy);
    assert_eq!(original.get_value_by_id(2).unwrap().as_f64(), Some(9.75));

    let copy = original.clone_source();
    drop(original);
    assert_eq!(copy.get_value_by_id(3).unwrap().as_str(), Some("south"));
}

#[test]
fn nested_records_resolve_their_own_descriptor() {
    let cache = cache();
    let label = varlena::pack_str("inner");
    let inner = form_record(
        &sample_desc(&cache),
        &[Datum::from_i64(5), Datum::from_f64(0.125), Datum::Ref(&label), Datum::from_bool(true)],
        &[false; 4],
    )
    .unwrap();
    let outer_desc = cache.lookup_rowtype(TypeTag(16501), -1).unwrap();
    let outer = form_record(&outer_desc, &[Datum::from_i32(3), Datum::Ref(&inner)], &[false, false]).unwrap();

    let source = RecordSource::new(&outer, &cache).unwrap();
    assert_eq!(source.get_value_by_id(1).unwrap().as_i32(), Some(3));

    let v = source.get_value_by_id(2).unwrap();
    assert_eq!(v.type_tag(), TypeTag(16500));
    let composite = v.as_composite().expect("composite field");
    assert_eq!(composite.bytes(), &inner[..]);
    assert_eq!(composite.get(1).unwrap().as_i64(), Some(5));
    assert_eq!(composite.get(2).unwrap().as_f64(), Some(0.125));
    assert_eq!(composite.get(3).unwrap().as_str(), Some("inner"));

    // Values returned by the nested source borrow the outer record, not the
    // handle that produced them.
    let label_value = composite.get(3).unwrap();
    drop(v);
    assert_eq!(label_value.as_str(), Some("inner"));
}

#[test]
fn anonymous_records_use_their_typmod() {
    let mut cache = TypeCache::new();
    let attrs = vec![
        cache.attribute("n", "int4").unwrap(),
        cache.attribute("s", "text").unwrap(),
    ];
    let desc = cache.register_anonymous(attrs);
    let s = varlena::pack_str("anon");
    let record = form_record(&desc, &[Datum::from_i32(11), Datum::Ref(&s)], &[false, false]).unwrap();

    let packed = PackedRecord::new(&record).unwrap();
    assert_eq!(packed.type_tag(), pg_type::RECORD);
    assert_eq!(packed.typmod(), desc.typmod);

    let source = RecordSource::from_record(packed, &cache);
    assert_eq!(source.get_value_by_id(1).unwrap().as_i32(), Some(11));
    assert_eq!(source.get_value_by_id(2).unwrap().as_str(), Some("anon"));
}

#[test]
fn unregistered_record_type_is_a_descriptor_error() {
    let cache = cache();
    let desc = TupleDescriptor::new(
        TypeTag(17000),
        vec![cache.attribute("a", "int4").unwrap()],
    );
    let record = form_record(&desc, &[Datum::from_i32(1)], &[false]).unwrap();
    let source = RecordSource::new(&record, &cache).unwrap();
    assert!(matches!(source.get_value_by_id(1), Err(DbalError::Descriptor(_))));
}

#[test]
fn corrupt_field_data_is_reported_with_the_field_name() {
    let cache = cache();
    let bad_utf8 = varlena::pack(&[0xff, 0xfe]);
    let record = form_record(
        &sample_desc(&cache),
        &[Datum::from_i64(1), Datum::from_f64(1.0), Datum::Ref(&bad_utf8), Datum::from_bool(true)],
        &[false; 4],
    )
    .unwrap();
    let source = RecordSource::new(&record, &cache).unwrap();

    let err = source.get_value_by_id(3).unwrap_err();
    assert!(matches!(err, DbalError::Malformed(ref m) if m.starts_with("field \"label\": ")));
    // Other fields are unaffected.
    assert_eq!(source.get_value_by_id(4).unwrap().value(), &Value::Bool(true));
}

#[test]
fn record_bytes_are_never_modified() {
    let cache = cache();
    let label = varlena::pack_str("ro");
    let record = form_record(
        &sample_desc(&cache),
        &[Datum::from_i64(1), Datum::from_f64(2.0), Datum::Ref(&label), Datum::from_bool(false)],
        &[false; 4],
    )
    .unwrap();
    let before = record.clone();
    let source = RecordSource::new(&record, &cache).unwrap();
    for id in 0..=5 {
        let _ = source.get_value_by_id(id);
    }
    assert_eq!(record, before);
}

#[test]
fn descriptor_types_line_up_with_builtins() {
    let cache = cache();
    let desc = sample_desc(&cache);
    let tags: Vec<TypeTag> = desc.attrs.iter().map(|a| a.type_tag).collect();
    assert_eq!(tags, vec![INT8, FLOAT8, TEXT, BOOL]);
    assert_ne!(tags[0], INT4);
}
