/*!

# Node RPC

## Introduction

An Echo node exposes a JSON-RPC interface over a single websocket. Many calls can be in flight on
that socket at once; responses come back in any order and are matched to their request by id.

## Requests

```json
{"id": 7, "method": "call", "params": [api_id, "method_name", [args...]]}
```

`id` is the call-correlation id. It starts at 1 for every connection and increases by one per
call. `api_id` selects which of the node's APIs handles the method.

## Responses

```json
{"id": 7, "result": ...}
{"id": 7, "error": {"message": "..."}}
```

A response is delivered to the call it names and the call is forgotten. A response for an id that
is not pending is logged and dropped.

## Notices

```json
{"method": "notice", "params": [callback_id, [[changed objects or ids...]]]}
```

Notices are not answers to a call. They are pushed after `set_subscribe_callback` for object
changes, and after `broadcast_transaction_with_callback` once the transaction lands in a block.

## API ids

The login API always has id 1. Every other API is looked up by name once per connection:

```text
login(user, password)          -> bool
database()                     -> api id
network_broadcast()            -> api id
history()                      -> api id
```

## Layout

- `socket_operation`: the typed calls and their result decoders
- `socket`: connection state, the pending-call table and inbound dispatch
- `connection`: the websocket driver that feeds `socket`
- `subscription`: which object ids are watched and by whom
- `client`: the handshake and everything a caller uses

*/

pub mod client;
pub mod connection;
pub mod socket;
pub mod socket_operation;
pub mod subscription;
