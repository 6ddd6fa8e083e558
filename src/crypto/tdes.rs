//! Two-key Triple-DES (3DES) as used by BAC secure messaging.

use {
    cbc::{Decryptor as CbcDec, Encryptor as CbcEnc},
    cipher::{
        block_padding::NoPadding, BlockDecrypt as _, BlockDecryptMut as _, BlockEncrypt as _,
        BlockEncryptMut as _, InnerIvInit as _, KeyInit as _,
    },
    des::{Des, TdesEde2},
};

const BLOCK_SIZE: usize = 8;

pub fn encrypt_block(key: &[u8], block: &mut [u8]) -> Option<()> {
    let cipher = TdesEde2::new_from_slice(key).ok()?;
    let block: &mut [u8; BLOCK_SIZE] = block.try_into().ok()?;
    cipher.encrypt_block(block.into());
    Some(())
}

pub fn cbc_encrypt(key: &[u8], iv: &[u8], data: &mut [u8]) -> Option<()> {
    let cipher = TdesEde2::new_from_slice(key).ok()?;
    let len = data.len();
    CbcEnc::inner_iv_slice_init(cipher, iv)
        .ok()?
        .encrypt_padded_mut::<NoPadding>(data, len)
        .ok()?;
    Some(())
}

pub fn cbc_decrypt(key: &[u8], iv: &[u8], data: &mut [u8]) -> Option<()> {
    let cipher = TdesEde2::new_from_slice(key).ok()?;
    CbcDec::inner_iv_slice_init(cipher, iv)
        .ok()?
        .decrypt_padded_mut::<NoPadding>(data)
        .ok()?;
    Some(())
}

/// Retail MAC (ISO 9797-1 MAC algorithm 3) using DES, over pre-padded data.
// See <https://crypto.stackexchange.com/questions/18951/what-are-options-to-compute-des-retail-mac-aka-iso-9797-1-mode-3-under-pkcs11>
pub fn retail_mac(key: &[u8], data: &[u8]) -> Option<[u8; 8]> {
    if key.len() != 16 || data.len() % BLOCK_SIZE != 0 {
        return None;
    }
    let des1 = Des::new_from_slice(&key[..8]).ok()?;
    let des2 = Des::new_from_slice(&key[8..]).ok()?;
    let mut state = [0_u8; BLOCK_SIZE];
    for block in data.chunks_exact(BLOCK_SIZE) {
        state.iter_mut().zip(block).for_each(|(s, b)| *s ^= b);
        des1.encrypt_block((&mut state).into());
    }
    des2.decrypt_block((&mut state).into());
    des1.encrypt_block((&mut state).into());
    Some(state)
}
