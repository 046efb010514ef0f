#[cfg(test)]
mod tests {
    use crate::field_mapper::prefix_mapper;
    use crate::mapper::{Mapper, Tag};
    use crate::reflect::Kind;
    use crate::value::SqlValue;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Barrier};

    #[derive(Default)]
    struct Base {
        id: i64,
        name: String,
    }

    crate::sql_struct! {
        impl Base {
            id:   { tag: "id,primary_key,auto_increment" },
            name: { tag: "" },
        }
    }

    #[derive(Default)]
    struct Profile {
        name: String,
        city: String,
    }

    crate::sql_struct! {
        impl Profile {
            name: { tag: "" },
            city: { tag: "" },
        }
    }

    #[derive(Default)]
    struct User {
        base: Base,
        name: String,
        profile: Profile,
        secret: String,
        skip: String,
        note: Option<String>,
        parent: Option<Box<User>>,
    }

    crate::sql_struct! {
        impl User {
            base:    { tag: "", embedded: true },
            name:    { tag: "name" },
            profile: { tag: "profile" },
            secret:  { tag: "", exported: false },
            skip:    { tag: "-" },
            note:    { tag: "" },
            parent:  { tag: "" },
        }
    }

    #[derive(Default)]
    struct Address {
        city: String,
    }

    crate::sql_struct! {
        impl Address {
            city: { tag: "city" },
        }
    }

    #[derive(Default)]
    struct Shipment {
        address: Option<Address>,
        named: Base,
    }

    crate::sql_struct! {
        impl Shipment {
            address: { tag: "" },
            named:   { tag: "b", embedded: true },
        }
    }

    #[derive(Default)]
    struct Leaf {
        d: i64,
    }

    crate::sql_struct! {
        impl Leaf {
            d: { tag: "d" },
        }
    }

    #[derive(Default)]
    struct Middle {
        c: Leaf,
    }

    crate::sql_struct! {
        impl Middle {
            c: { tag: "c" },
        }
    }

    #[derive(Default)]
    struct Top {
        b: Middle,
        e: i64,
    }

    crate::sql_struct! {
        impl Top {
            b: { tag: "b" },
            e: { tag: "" },
        }
    }

    #[derive(Default)]
    struct Inner3 {
        deep: i64,
        name: String,
    }

    crate::sql_struct! {
        impl Inner3 {
            deep: { tag: "" },
            name: { tag: "" },
        }
    }

    #[derive(Default)]
    struct Middle3 {
        inner: Inner3,
        name: String,
    }

    crate::sql_struct! {
        impl Middle3 {
            inner: { tag: "", embedded: true },
            name:  { tag: "" },
        }
    }

    #[derive(Default)]
    struct Outer3 {
        middle: Middle3,
        top: i64,
    }

    crate::sql_struct! {
        impl Outer3 {
            middle: { tag: "", embedded: true },
            top:    { tag: "" },
        }
    }

    #[test]
    fn tag_parsing() {
        let t = Tag::parse("name, size=60 ,auto_increment,,Charset=latin1");
        assert_eq!(t.name(), "name");
        assert_eq!(t.look_up("size"), Some("60"));
        assert_eq!(t.look_up("auto_increment"), Some(""));
        assert_eq!(t.look_up("charset"), Some("latin1"));
        assert!(t.has("auto_increment"));
        assert!(!t.has("unique"));
        assert_eq!(Tag::parse("").name(), "");
    }

    #[test]
    fn codec_is_cached_per_type() {
        let _ = env_logger::builder().is_test(true).try_init();
        let m = Mapper::new();
        let a = m.codec_by_type::<User>();
        let b = m.codec_by_type::<User>();
        assert!(Arc::ptr_eq(&a, &b));
        let other = m.codec_by_type::<Profile>();
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[test]
    fn concurrent_lookups_share_one_codec() {
        let m = Mapper::new();
        let barrier = Barrier::new(8);
        let codecs: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        m.codec_by_type::<User>()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for c in &codecs[1..] {
            assert!(Arc::ptr_eq(&codecs[0], c));
        }
    }

    #[test]
    fn properties_follow_embedding_and_shadowing() {
        let m = Mapper::new();
        let codec = m.codec_by_type::<User>();
        let names: Vec<&str> = codec.properties().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["id", "name", "profile", "note", "parent"]);

        let name = codec.look_up_field_by_name("name").unwrap();
        assert_eq!(name.index(), &[1]);
        // the promoted field is still reachable by its traversal index
        let shadowed = codec.get_by_traversal(&[0, 1]).unwrap();
        assert_eq!(shadowed.path(), "name");
        assert!(shadowed.tag().look_up("primary_key").is_none());
    }

    #[test]
    fn skipped_fields_are_absent() {
        let m = Mapper::new();
        let codec = m.codec_by_type::<User>();
        assert!(codec.look_up_field_by_name("secret").is_none());
        assert!(codec.look_up_field_by_name("skip").is_none());
        assert!(codec.get_by_traversal(&[3]).is_none());
        assert!(codec.get_by_traversal(&[4]).is_none());
    }

    #[test]
    fn look_up_falls_back_to_case_insensitive() {
        let m = Mapper::new();
        let codec = m.codec_by_type::<User>();
        assert_eq!(codec.look_up_field_by_name("ID").unwrap().index(), &[0, 0]);
        assert_eq!(
            codec.look_up_field_by_name("profile.city").unwrap().index(),
            &[2, 1]
        );
        assert_eq!(
            codec.look_up_field_by_name("Profile.City").unwrap().index(),
            &[2, 1]
        );
    }

    #[test]
    fn tree_links_and_column_ancestor() {
        let m = Mapper::new();
        let codec = m.codec_by_type::<User>();
        let profile = codec.look_up_field_by_name("profile").unwrap();
        let children: Vec<&str> = codec
            .children(profile)
            .iter()
            .map(|f| f.path())
            .collect();
        assert_eq!(children, vec!["profile.name", "profile.city"]);

        let city = codec.look_up_field_by_name("profile.city").unwrap();
        assert_eq!(codec.parent_field(city).unwrap().name(), "profile");
        assert_eq!(codec.column_ancestor(city).unwrap().name(), "profile");

        let id = codec.look_up_field_by_name("id").unwrap();
        assert_eq!(codec.parent_field(id).unwrap().name(), "base");
        assert!(codec.column_ancestor(id).is_none());
    }

    #[test]
    fn self_reference_is_a_leaf() {
        let m = Mapper::new();
        let codec = m.codec_by_type::<User>();
        let parent = codec.look_up_field_by_name("parent").unwrap();
        assert!(parent.is_nullable());
        assert_eq!(parent.ty().kind(), Kind::Ptr);
        assert!(codec.children(parent).is_empty());
        assert!(codec.look_up_field_by_name("parent.id").is_none());
    }

    #[test]
    fn nullable_propagates_to_descendants() {
        let m = Mapper::new();
        let codec = m.codec_by_type::<Shipment>();
        let city = codec.look_up_field_by_name("address.city").unwrap();
        assert!(city.is_nullable());
        assert!(!codec.look_up_field_by_name("b").unwrap().is_nullable());
    }

    #[test]
    fn embedded_with_explicit_name_is_not_promoted() {
        let m = Mapper::new();
        let codec = m.codec_by_type::<Shipment>();
        let names: Vec<&str> = codec.properties().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["address", "b"]);
        assert_eq!(codec.look_up_field_by_name("b.id").unwrap().index(), &[1, 0]);
        assert!(codec.look_up_field_by_name("b").unwrap().is_embedded());
    }

    #[test]
    fn deep_nesting_builds_full_paths() {
        let m = Mapper::new();
        let codec = m.codec_by_type::<Top>();
        let d = codec.look_up_field_by_name("b.c.d").unwrap();
        assert_eq!(d.index(), &[0, 0, 0]);
        assert_eq!(codec.column_ancestor(d).unwrap().path(), "b.c");
        let names: Vec<&str> = codec.properties().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["b", "e"]);
    }

    #[test]
    fn three_level_embedding_prefers_shallower_name() {
        let m = Mapper::new();
        let codec = m.codec_by_type::<Outer3>();
        let props: Vec<(&str, &[usize])> = codec
            .properties()
            .iter()
            .map(|f| (f.name(), f.index()))
            .collect();
        assert_eq!(
            props,
            vec![
                ("deep", &[0, 0, 0][..]),
                ("name", &[0, 1][..]),
                ("top", &[1][..]),
            ]
        );
        assert_eq!(codec.look_up_field_by_name("name").unwrap().index(), &[0, 1]);
        assert_eq!(codec.get_by_traversal(&[0, 0, 1]).unwrap().path(), "name");
        let deep = codec.look_up_field_by_name("deep").unwrap();
        assert!(codec.column_ancestor(deep).is_none());
        assert!(codec.column_root(deep).is_none());
    }

    #[test]
    fn column_root_is_the_outermost_named_struct() {
        let m = Mapper::new();
        let codec = m.codec_by_type::<Top>();
        let d = codec.look_up_field_by_name("b.c.d").unwrap();
        assert_eq!(codec.column_ancestor(d).unwrap().path(), "b.c");
        assert_eq!(codec.column_root(d).unwrap().path(), "b");
    }

    #[test]
    fn field_mapper_applies_to_untagged_fields() {
        let m = Mapper::with_field_mapper(prefix_mapper("f_"));
        let codec = m.codec_by_type::<Top>();
        let names: Vec<&str> = codec.properties().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["b", "f_e"]);
    }

    #[test]
    fn values_follow_properties_order() {
        let m = Mapper::new();
        let codec = m.codec_by_type::<User>();
        let u = User {
            base: Base {
                id: 7,
                name: "hidden".to_string(),
            },
            name: "alice".to_string(),
            profile: Profile {
                name: "A".to_string(),
                city: "KL".to_string(),
            },
            ..Default::default()
        };
        assert_eq!(
            codec.values_of(&u),
            vec![
                SqlValue::I64(7),
                SqlValue::from("alice"),
                SqlValue::Json(serde_json::json!({"name": "A", "city": "KL"})),
                SqlValue::Null,
                SqlValue::Null,
            ]
        );
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn values_of_rejects_other_types() {
        let m = Mapper::new();
        let codec = m.codec_by_type::<User>();
        let _ = codec.values_of(&Top::default());
    }

    #[test]
    #[should_panic(expected = "expected a struct type")]
    fn non_struct_types_panic() {
        let m = Mapper::new();
        let _ = m.codec_by_type::<i64>();
    }
}
