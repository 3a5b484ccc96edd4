// tests/service_tests.rs

mod support;

use content_cipher::{CryptoError, EncryptionError};
use support::{key_a, key_b, TestService};

fn some(values: &[&str]) -> Vec<Option<String>> {
    values.iter().map(|v| Some(v.to_string())).collect()
}

#[test]
fn encrypts_and_decrypts_a_single_value() {
    let fixture = TestService::new();
    fixture.service.update_cipher_key(&key_a()).unwrap();

    let encrypted = fixture.service.encrypt_content(&some(&["hello"])).unwrap();
    assert_eq!(encrypted.len(), 1);
    let ciphertext = encrypted[0].as_ref().unwrap();
    assert_ne!(ciphertext, "hello");
    assert!(base64::Engine::decode(&base64::engine::general_purpose::STANDARD, ciphertext).is_ok());

    let decrypted = fixture.service.decrypt_content(&encrypted).unwrap();
    assert_eq!(decrypted, some(&["hello"]));
}

#[test]
fn round_trips_empty_and_multibyte_values() {
    let fixture = TestService::new();
    fixture.service.update_cipher_key(&key_a()).unwrap();

    let parts = some(&["", "héllo wörld", "日本語のテキスト", "a\nb\tc"]);
    let encrypted = fixture.service.encrypt_content(&parts).unwrap();
    let decrypted = fixture.service.decrypt_content(&encrypted).unwrap();
    assert_eq!(decrypted, parts);
}

#[test]
fn none_parts_pass_through_unchanged() {
    let fixture = TestService::new();
    fixture.service.update_cipher_key(&key_a()).unwrap();

    let parts = vec![Some("x".to_string()), None, Some("y".to_string())];
    let encrypted = fixture.service.encrypt_content(&parts).unwrap();
    assert!(encrypted[1].is_none());
    assert!(encrypted[0].is_some() && encrypted[2].is_some());

    let decrypted = fixture.service.decrypt_content(&encrypted).unwrap();
    assert_eq!(decrypted, parts);
}

#[test]
fn field_mappings_keep_keys_and_null_values() {
    let fixture = TestService::new();
    fixture.service.update_cipher_key(&key_a()).unwrap();

    let mut fields = content_cipher::ContentFields::new();
    fields.insert("title".to_string(), Some("secret title".to_string()));
    fields.insert("summary".to_string(), None);

    let encrypted = fixture.service.encrypt_content_fields(&fields).unwrap();
    assert_eq!(encrypted.len(), 2);
    assert!(encrypted["summary"].is_none());
    assert_ne!(encrypted["title"], fields["title"]);

    let decrypted = fixture.service.decrypt_content_fields(&encrypted).unwrap();
    assert_eq!(decrypted, fields);
}

#[test]
fn encrypting_without_a_key_fails_with_key_unavailable() {
    let fixture = TestService::new();
    let result = fixture.service.encrypt_content(&some(&["hello"]));
    assert!(matches!(
        result,
        Err(EncryptionError::Crypto(CryptoError::KeyUnavailable { .. }))
    ));
}

#[test]
fn rejects_a_non_hexadecimal_key() {
    let fixture = TestService::new();
    let result = fixture.service.update_cipher_key("not-hex-at-all");
    assert!(matches!(result, Err(EncryptionError::Validation(_))));
    assert!(!fixture.current_key_file().exists());
}

#[test]
fn rejects_a_key_of_the_wrong_length() {
    let fixture = TestService::new();
    fixture.service.update_cipher_key(&key_a()).unwrap();
    let before = std::fs::read(fixture.current_key_file()).unwrap();

    let sixty_three = "0".repeat(63);
    let result = fixture.service.update_cipher_key(&sixty_three);
    assert!(matches!(result, Err(EncryptionError::Validation(_))));

    // Validation happens before any file is touched.
    let after = std::fs::read(fixture.current_key_file()).unwrap();
    assert_eq!(before, after);
}

#[test]
fn decrypting_garbage_fails_with_malformed_ciphertext() {
    let fixture = TestService::new();
    fixture.service.update_cipher_key(&key_a()).unwrap();

    let result = fixture
        .service
        .decrypt_content(&some(&["this is not base64!!"]));
    assert!(matches!(
        result,
        Err(EncryptionError::Crypto(CryptoError::MalformedCiphertext(_)))
    ));
}

#[test]
fn cipher_key_defined_tracks_key_updates() {
    let fixture = TestService::new();
    assert!(!fixture.service.is_cipher_key_defined());

    fixture.service.update_cipher_key(&key_a()).unwrap();
    assert!(fixture.service.is_cipher_key_defined());

    fixture.service.update_cipher_key(&key_b()).unwrap();
    assert!(fixture.service.is_cipher_key_defined());
    assert!(fixture.previous_key_file().exists());
}

#[test]
fn old_ciphertext_is_unreadable_after_rotation() {
    let fixture = TestService::new();
    fixture.service.update_cipher_key(&key_a()).unwrap();
    let encrypted = fixture.service.encrypt_content(&some(&["hello"])).unwrap();

    fixture.service.update_cipher_key(&key_b()).unwrap();
    assert!(fixture.service.decrypt_content(&encrypted).is_err());
}
