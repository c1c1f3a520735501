// Copyright (C) Microsoft Corporation. All rights reserved.

use super::*;

// NIST SP 800-38A F.2.1 CBC-AES128.Encrypt
const CBC128_KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";
const CBC128_IV: &str = "000102030405060708090a0b0c0d0e0f";
const CBC128_PT: &str = "6bc1bee22e409f96e93d7e117393172a\
                         ae2d8a571e03ac9c9eb76fac45af8e51\
                         30c81c46a35ce411e5fbc1191a0a52ef\
                         f69f2445df4f9b17ad2b417be66c3710";
const CBC128_CT: &str = "7649abac8119b246cee98e9b12e9197d\
                         5086cb9b507219ee95db113a917678b2\
                         73bed6b8e3c1743b7116e69e22229516\
                         3ff1caa1681fac09120eca307586e1a7";

#[test]
fn test_aes128_cbc_encrypt_multipart() {
    let key = hex::decode(CBC128_KEY).unwrap();
    let iv = hex::decode(CBC128_IV).unwrap();
    let pt = hex::decode(CBC128_PT).unwrap();
    let ct = hex::decode(CBC128_CT).unwrap();

    let mut op =
        CipherOperation::encrypt_setup(&attrs(), &key, CipherAlg::CbcNoPadding).unwrap();
    op.set_iv(&iv).expect("set_iv failed");

    let mut output = vec![0u8; pt.len()];
    let count = op.update(&pt, Some(&mut output)).expect("update failed");
    assert_eq!(count, pt.len());
    assert_eq!(output, ct);

    let count = op.finish(Some(&mut [])).expect("finish failed");
    assert_eq!(count, 0);
}

#[test]
fn test_aes128_cbc_decrypt_multipart() {
    let key = hex::decode(CBC128_KEY).unwrap();
    let iv = hex::decode(CBC128_IV).unwrap();
    let pt = hex::decode(CBC128_PT).unwrap();
    let ct = hex::decode(CBC128_CT).unwrap();

    let mut op =
        CipherOperation::decrypt_setup(&attrs(), &key, CipherAlg::CbcNoPadding).unwrap();
    op.set_iv(&iv).expect("set_iv failed");

    let mut output = vec![0u8; ct.len()];
    let mut offset = 0;
    // fragments that straddle block boundaries exercise the chain carry
    for fragment in ct.chunks(21) {
        offset += op
            .update(fragment, Some(&mut output[offset..]))
            .expect("update failed");
    }
    offset += op.finish(Some(&mut output[offset..])).expect("finish failed");
    assert_eq!(offset, pt.len());
    assert_eq!(output, pt);
}

// NIST SP 800-38A F.2.5 CBC-AES256.Encrypt
#[test]
fn test_aes256_cbc_encrypt_decrypt() {
    let key = hex::decode("603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4")
        .unwrap();
    let iv = hex::decode(CBC128_IV).unwrap();
    let pt = hex::decode(CBC128_PT).unwrap();
    let ct = hex::decode(
        "f58c4c04d6e5f1ba779eabfb5f7bfbd6\
         9cfc4e967edb808d679f777bc6702c7d\
         39f23369a9d9bacfa530e26304231461\
         b2eb05e2c39be9fcda6c19078c6a9d1b",
    )
    .unwrap();

    let actual_ct =
        Cipher::encrypt_vec(&attrs(), &key, CipherAlg::CbcNoPadding, Some(&iv), &pt).unwrap();
    assert_eq!(actual_ct, ct);

    let mut framed = iv.clone();
    framed.extend_from_slice(&ct);
    let actual_pt = Cipher::decrypt_vec(&attrs(), &key, CipherAlg::CbcNoPadding, &framed).unwrap();
    assert_eq!(actual_pt, pt);
}

#[test]
fn test_cbc_nopad_finish_unaligned() {
    let key = [7u8; 16];
    let iv = [1u8; 16];

    let mut op =
        CipherOperation::encrypt_setup(&attrs(), &key, CipherAlg::CbcNoPadding).unwrap();
    op.set_iv(&iv).unwrap();

    let mut output = [0u8; 16];
    let count = op.update(&[2u8; 19], Some(&mut output)).unwrap();
    assert_eq!(count, 16);

    let err = op.finish(Some(&mut output)).unwrap_err();
    assert_eq!(err, CipherError::InvalidArgument);
}

#[test]
fn test_cbc_pkcs7_multipart_round_trip() {
    let key = [0x42u8; 32];
    let iv = [9u8; 16];
    let message = b"a message that is not block aligned";

    let mut op = CipherOperation::encrypt_setup(&attrs(), &key, CipherAlg::CbcPkcs7).unwrap();
    op.set_iv(&iv).unwrap();
    let mut ciphertext = vec![0u8; message.len() + AES_BLOCK_SIZE];
    let mut offset = 0;
    for fragment in message.chunks(7) {
        offset += op
            .update(fragment, Some(&mut ciphertext[offset..]))
            .expect("update failed");
    }
    offset += op
        .finish(Some(&mut ciphertext[offset..]))
        .expect("finish failed");
    ciphertext.truncate(offset);
    assert_eq!(ciphertext.len(), 48);

    let mut op = CipherOperation::decrypt_setup(&attrs(), &key, CipherAlg::CbcPkcs7).unwrap();
    op.set_iv(&iv).unwrap();
    let mut plaintext = vec![0u8; ciphertext.len()];
    let mut offset = 0;
    for fragment in ciphertext.chunks(11) {
        offset += op
            .update(fragment, Some(&mut plaintext[offset..]))
            .expect("update failed");
    }
    offset += op
        .finish(Some(&mut plaintext[offset..]))
        .expect("finish failed");
    plaintext.truncate(offset);
    assert_eq!(plaintext, message);
}

// finish may be retried with a larger buffer after BufferTooSmall
#[test]
fn test_cbc_pkcs7_decrypt_finish_retry() {
    let key = [0x13u8; 16];
    let iv = [0x37u8; 16];
    let message = [0xC5u8; 12];

    let ciphertext =
        Cipher::encrypt_vec(&attrs(), &key, CipherAlg::CbcPkcs7, Some(&iv), &message).unwrap();
    assert_eq!(ciphertext.len(), 16);

    let mut op = CipherOperation::decrypt_setup(&attrs(), &key, CipherAlg::CbcPkcs7).unwrap();
    op.set_iv(&iv).unwrap();

    // the single ciphertext block is held back for padding removal
    let mut output = [0xFFu8; 16];
    let count = op.update(&ciphertext, Some(&mut output)).unwrap();
    assert_eq!(count, 0);
    assert_eq!(output, [0xFFu8; 16]);

    let err = op.finish(Some(&mut output[..8])).unwrap_err();
    assert_eq!(err, CipherError::BufferTooSmall);
    assert_eq!(output, [0xFFu8; 16]);

    let count = op.finish(Some(&mut output)).expect("retry failed");
    assert_eq!(count, message.len());
    assert_eq!(&output[..count], &message[..]);
}

#[test]
fn test_cbc_pkcs7_invalid_padding() {
    let key = [0x77u8; 16];
    let iv = [0x88u8; 16];
    // 0x11 everywhere decrypts to a padding byte of 17, which is out of range
    let bogus_pt = [0x11u8; 16];
    let ciphertext =
        Cipher::encrypt_vec(&attrs(), &key, CipherAlg::CbcNoPadding, Some(&iv), &bogus_pt)
            .unwrap();

    let mut op = CipherOperation::decrypt_setup(&attrs(), &key, CipherAlg::CbcPkcs7).unwrap();
    op.set_iv(&iv).unwrap();
    let mut output = [0u8; 16];
    let count = op.update(&ciphertext, Some(&mut output)).unwrap();
    assert_eq!(count, 0);

    let err = op.finish(Some(&mut output)).unwrap_err();
    assert_eq!(err, CipherError::InvalidPadding);

    // padding failure concluded the operation
    let err = op.finish(Some(&mut output)).unwrap_err();
    assert_eq!(err, CipherError::BadState);
}

#[test]
fn test_cbc_pkcs7_decrypt_truncated_ciphertext() {
    let key = [0x55u8; 16];
    let iv = [0x66u8; 16];

    let mut op = CipherOperation::decrypt_setup(&attrs(), &key, CipherAlg::CbcPkcs7).unwrap();
    op.set_iv(&iv).unwrap();
    let mut output = [0u8; 16];
    let count = op.update(&[0xABu8; 8], Some(&mut output)).unwrap();
    assert_eq!(count, 0);

    // eight buffered bytes are not a whole ciphertext block
    let err = op.finish(Some(&mut output)).unwrap_err();
    assert_eq!(err, CipherError::InvalidArgument);
}
