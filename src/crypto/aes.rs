//! AES primitives, generic over the key size.

use {
    cbc::{Decryptor as CbcDec, Encryptor as CbcEnc},
    cipher::{
        block_padding::NoPadding, generic_array::GenericArray, BlockCipher, BlockDecryptMut,
        BlockEncrypt, BlockEncryptMut, InnerIvInit as _, KeyInit,
    },
    cmac::Mac,
};

pub fn encrypt_block<C: BlockEncrypt + KeyInit>(key: &[u8], block: &mut [u8]) -> Option<()> {
    let cipher = C::new_from_slice(key).ok()?;
    cipher.encrypt_block(GenericArray::from_mut_slice(block));
    Some(())
}

pub fn cbc_encrypt<C>(key: &[u8], iv: &[u8], data: &mut [u8]) -> Option<()>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let cipher = C::new_from_slice(key).ok()?;
    let len = data.len();
    CbcEnc::inner_iv_slice_init(cipher, iv)
        .ok()?
        .encrypt_padded_mut::<NoPadding>(data, len)
        .ok()?;
    Some(())
}

pub fn cbc_decrypt<C>(key: &[u8], iv: &[u8], data: &mut [u8]) -> Option<()>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let cipher = C::new_from_slice(key).ok()?;
    CbcDec::inner_iv_slice_init(cipher, iv)
        .ok()?
        .decrypt_padded_mut::<NoPadding>(data)
        .ok()?;
    Some(())
}

/// CMAC truncated to the leading 8 bytes.
///
/// See BSI TR-03110-3 section F.2.2.
pub fn cmac<M: Mac + KeyInit>(key: &[u8], data: &[u8]) -> Option<[u8; 8]> {
    let mut mac = <M as KeyInit>::new_from_slice(key).ok()?;
    Mac::update(&mut mac, data);
    let tag = mac.finalize().into_bytes();
    tag.get(..8)?.try_into().ok()
}
