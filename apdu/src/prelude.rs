//! Prelude to simplify downstream use of APDU objects

pub use crate::{
    app_info::{AppNameReq, AppNameResp, VersionReq, VersionResp},
    chunk::{sign_frames, ChunkFlags, Chunks},
    cursor::{ByteCursor, Endian},
    frame::{header, CommandFrame, ResponseFrame},
    message::{MsgFormat, PersonalMsg, PersonalMsgError},
    path::{Bip32Path, PathError},
    public_key::{PublicKeyReq, PublicKeyResp},
    sign::SignResp,
    status::{StatusCode, SW_DENY, SW_OK},
    transaction::{Transaction, TransactionError, TxHeader, TxType},
    varint::VarInt,
    ApduError, ApduHeader, ApduReq, ApduStatic, CodecError, Instruction, ONT_APDU_CLA,
};
