//! Loading certificates from PEM and DER files.

mod common;

use simtrust::cert::Certificate;

#[test]
fn load_pem_and_der_agree() {
    let dir = common::temp_home();
    let (der, pem) = common::make_ca("Loader CA");
    let pem_path = dir.path().join("ca.pem");
    let der_path = dir.path().join("ca.der");
    std::fs::write(&pem_path, pem).unwrap();
    std::fs::write(&der_path, &der).unwrap();

    let from_pem = Certificate::load(&pem_path).unwrap();
    let from_der = Certificate::load(&der_path).unwrap();
    assert_eq!(from_pem, from_der);
    assert_eq!(from_pem.der(), der.as_slice());
}

#[test]
fn load_missing_file_fails() {
    let dir = common::temp_home();
    let err = Certificate::load(&dir.path().join("nope.pem")).unwrap_err();
    assert!(err.to_string().contains("read certificate"));
}

#[test]
fn load_garbage_fails() {
    let dir = common::temp_home();
    let path = dir.path().join("garbage.crt");
    std::fs::write(&path, b"definitely not a certificate").unwrap();
    assert!(Certificate::load(&path).is_err());
}
