//! Integration tests for file lifecycle and error paths: creation modes,
//! open modes, close semantics and definition-time validation.

use std::io::Write as _;

use ndfile::{CreationMode, DataType, Error, File, OpenMode};

#[test]
fn test_no_clobber_rejects_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("existing.ndf");

    let mut file = File::create(&path).unwrap();
    file.close().unwrap();

    let err = File::create_opts(&path, CreationMode::NoClobber).unwrap_err();
    assert!(matches!(err, Error::Create { .. }), "got {err:?}");
}

#[test]
fn test_clobber_truncates_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("truncated.ndf");

    let mut file = File::create(&path).unwrap();
    file.add_dimension("x", 4).unwrap();
    file.add_variable("values", &["x"], DataType::Int32).unwrap();
    file.close().unwrap();

    let mut file = File::create_opts(&path, CreationMode::Clobber).unwrap();
    file.close().unwrap();

    let file = File::open(&path).unwrap();
    assert_eq!(file.num_dimensions(), 0);
    assert_eq!(file.num_variables(), 0);
}

#[test]
fn test_open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = File::open(dir.path().join("no_such_file.ndf")).unwrap_err();
    assert!(matches!(err, Error::Open { .. }), "got {err:?}");
}

#[test]
fn test_open_rejects_foreign_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not_a_container.ndf");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(b"definitely not a container header").unwrap();
    drop(f);

    let err = File::open(&path).unwrap_err();
    assert!(matches!(err, Error::Open { .. }), "got {err:?}");
}

#[test]
fn test_close_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("closed_twice.ndf");

    let mut file = File::create(&path).unwrap();
    file.close().unwrap();
    assert!(!file.is_open());
    file.close().unwrap();
}

#[test]
fn test_derived_objects_fail_after_close() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("closed.ndf");

    let mut file = File::create(&path).unwrap();
    file.add_dimension("x", 4).unwrap();
    let var = file.add_variable("values", &["x"], DataType::Int32).unwrap();
    file.close().unwrap();

    // catalog queries still answer from the in-memory snapshot
    assert!(file.has_variable("values"));
    assert_eq!(var.rank(), 1);

    // anything touching the store reports the closed handle
    let err = var.read::<i32>().unwrap_err();
    assert!(matches!(err, Error::ResourceClosed), "got {err:?}");
    let err = var.write(&[1i32, 2, 3, 4]).unwrap_err();
    assert!(matches!(err, Error::ResourceClosed), "got {err:?}");
}

#[test]
fn test_type_enforcement() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("typed.ndf");

    let mut file = File::create(&path).unwrap();
    file.add_dimension("x", 4).unwrap();
    let var = file.add_variable("values", &["x"], DataType::Int32).unwrap();
    var.write(&[1i32, 2, 3, 4]).unwrap();

    let err = var.write(&[1.0f64, 2.0, 3.0, 4.0]).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }), "got {err:?}");
    let err = var.read::<f64>().unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }), "got {err:?}");

    // the rejected write did not touch the payload
    assert_eq!(var.read::<i32>().unwrap(), vec![1, 2, 3, 4]);
    file.close().unwrap();
}

#[test]
fn test_undefined_dimension_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("undef_dim.ndf");

    let mut file = File::create(&path).unwrap();
    file.add_dimension("x", 4).unwrap();
    let err = file
        .add_variable("values", &["x", "bogus"], DataType::Int32)
        .unwrap_err();
    assert!(matches!(err, Error::UndefinedDimension(_)), "got {err:?}");
    assert!(!file.has_variable("values"));
    file.close().unwrap();
}

#[test]
fn test_duplicate_names_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("duplicates.ndf");

    let mut file = File::create(&path).unwrap();
    file.add_dimension("x", 4).unwrap();
    file.add_variable("values", &["x"], DataType::Int32).unwrap();
    file.add_group("details").unwrap();

    let err = file.add_dimension("x", 8).unwrap_err();
    assert!(matches!(err, Error::DuplicateName { .. }), "got {err:?}");
    let err = file.add_unlimited_dimension("x").unwrap_err();
    assert!(matches!(err, Error::DuplicateName { .. }), "got {err:?}");
    let err = file
        .add_variable("values", &["x"], DataType::Float32)
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateName { .. }), "got {err:?}");
    let err = file.add_group("details").unwrap_err();
    assert!(matches!(err, Error::DuplicateName { .. }), "got {err:?}");

    // the originals survive unchanged
    assert_eq!(file.get_dimension("x").unwrap().size(), 4);
    assert_eq!(
        file.get_variable("values").unwrap().data_type(),
        DataType::Int32
    );
    file.close().unwrap();
}

#[test]
fn test_share_mode_is_read_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.ndf");

    let mut file = File::create(&path).unwrap();
    file.add_dimension("x", 4).unwrap();
    let var = file.add_variable("values", &["x"], DataType::Int32).unwrap();
    var.write(&[7i32, 8, 9, 10]).unwrap();
    file.close().unwrap();

    let mut file = File::open_opts(&path, OpenMode::Share).unwrap();
    let var = file.get_variable("values").unwrap();
    assert_eq!(var.read::<i32>().unwrap(), vec![7, 8, 9, 10]);

    assert!(var.write(&[0i32, 0, 0, 0]).is_err());
    assert!(file.add_dimension("y", 2).is_err());
    file.close().unwrap();
}

#[test]
fn test_write_share_mode_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("write_shared.ndf");

    let mut file = File::create(&path).unwrap();
    file.add_dimension("x", 4).unwrap();
    file.add_variable("values", &["x"], DataType::Int32).unwrap();
    file.close().unwrap();

    let mut file = File::open_opts(&path, OpenMode::WriteShare).unwrap();
    let var = file.get_variable("values").unwrap();
    var.write(&[4i32, 3, 2, 1]).unwrap();
    file.close().unwrap();

    let file = File::open(&path).unwrap();
    let var = file.get_variable("values").unwrap();
    assert_eq!(var.read::<i32>().unwrap(), vec![4, 3, 2, 1]);
}

#[test]
fn test_definitions_after_writes() {
    // mode transitions stay hidden behind the object layer
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("interleaved.ndf");

    let mut file = File::create(&path).unwrap();
    file.add_dimension("x", 3).unwrap();
    let first = file.add_variable("first", &["x"], DataType::Int32).unwrap();
    first.write(&[1i32, 2, 3]).unwrap();

    // back into define mode, then write again
    let second = file.add_variable("second", &["x"], DataType::Int32).unwrap();
    second.write(&[4i32, 5, 6]).unwrap();
    file.close().unwrap();

    let file = File::open(&path).unwrap();
    assert_eq!(
        file.get_variable("first").unwrap().read::<i32>().unwrap(),
        vec![1, 2, 3]
    );
    assert_eq!(
        file.get_variable("second").unwrap().read::<i32>().unwrap(),
        vec![4, 5, 6]
    );
}

#[test]
fn test_out_of_range_access_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ranges.ndf");

    let mut file = File::create(&path).unwrap();
    file.add_dimension("x", 4).unwrap();
    file.add_dimension("y", 6).unwrap();
    let var = file
        .add_variable("values", &["x", "y"], DataType::Int32)
        .unwrap();

    // buffer length must match the selection
    let err = var.write(&[1i32, 2, 3]).unwrap_err();
    assert!(matches!(err, Error::Range(_)), "got {err:?}");

    // fixed dimensions do not grow
    let err = var
        .write_slab(&[3, 0], &[2, 6], &vec![0i32; 12])
        .unwrap_err();
    assert!(matches!(err, Error::Range(_)), "got {err:?}");

    // reads never extend the variable either
    let err = var.read_slab::<i32>(&[0, 4], &[4, 4]).unwrap_err();
    assert!(matches!(err, Error::Range(_)), "got {err:?}");

    // scalar access requires rank zero
    let err = var.write_scalar(1i32).unwrap_err();
    assert!(matches!(err, Error::Range(_)), "got {err:?}");
    file.close().unwrap();
}

#[test]
fn test_unlimited_dimension_growth() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("growing.ndf");

    let mut file = File::create(&path).unwrap();
    file.add_unlimited_dimension("record").unwrap();
    file.add_dimension("channel", 3).unwrap();
    let var = file
        .add_variable("samples", &["record", "channel"], DataType::Float64)
        .unwrap();

    assert_eq!(var.shape().unwrap(), vec![0, 3]);

    var.write_slab(&[0, 0], &[2, 3], &[1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0])
        .unwrap();
    assert_eq!(var.shape().unwrap(), vec![2, 3]);

    // append another record
    var.write_slab(&[2, 0], &[1, 3], &[7.0f64, 8.0, 9.0]).unwrap();
    assert_eq!(var.shape().unwrap(), vec![3, 3]);
    file.close().unwrap();

    let file = File::open(&path).unwrap();
    assert_eq!(file.get_dimension("record").unwrap().size(), 3);
    let var = file.get_variable("samples").unwrap();
    assert_eq!(
        var.read::<f64>().unwrap(),
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]
    );
}

#[test]
fn test_group_dimensions_visible_to_children() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inherited.ndf");

    let mut file = File::create(&path).unwrap();
    file.add_dimension("time", 5).unwrap();
    {
        let group = file.add_group("forecast").unwrap();
        // a dimension defined in an ancestor is usable here
        let var = group
            .add_variable("lead_time", &["time"], DataType::Int32)
            .unwrap();
        var.write(&[0i32, 6, 12, 18, 24]).unwrap();
    }
    file.close().unwrap();

    let file = File::open(&path).unwrap();
    let group = file.get_group("forecast").unwrap();
    let var = group.get_variable("lead_time").unwrap();
    assert_eq!(var.read::<i32>().unwrap(), vec![0, 6, 12, 18, 24]);
    assert_eq!(var.dimensions()[0].name(), "time");
}
