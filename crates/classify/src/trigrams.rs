use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Chunks with fewer letter trigrams than this are too short to judge.
const MIN_TRIGRAMS: usize = 3;
/// A chunk is random letters when under 1/N of its trigrams are known.
const KNOWN_SHARE_DIVISOR: usize = 5;

/// Everyday English plus the vocabulary that shows up in web APIs.
const VOCABULARY: &str = "
about account action active add address admin ads advert after agent alert alias
alive all allow also amazon analytics and android angular any api app apple
application archive asset audit auth author authorize avatar aws azure babel back
backup badge balance banner base batch beacon because bill billing blob block blog
board body book bookmark brand broadcast browse bucket budget buffer build bundle
but button cache calendar call callback campaign can cancel card careers cart
catalog category change channel chart chat check checkout child chrome chunk city
claim class clear click client close cloud cluster code collect collection come
comment commit common company compare compute config confirm connect consent contact
container content context contract control cookie copy could count country coupon
create credential credit css csv current cursor customer dashboard data database
date day deal debug default delete delivery deploy detail details device dialog diff
digest direct directory disable discord discount display docker docs document domain
download draft driver edge edit elastic email embed embeddable enable end endpoint
entry environment error even event events exchange export exports extension external
facebook faq favicon feature feed feedback field file filter find firebase firefox
first flag folder follow font footer for form format forward frame friend from
function gallery game gateway gcp generate get github give global golang good google
grafana graph graphql greater group grpc guest handler hash hashes have header
health healthz heartbeat helm help her him his history home hook host hour how html
http https icon identity image import inbox include index infinity info input
insight instagram install instance integration internal into invite invoice ipad
iphone issue item items its java javascript job join journal jpeg json just jwks
kafka key kibana know known kubernetes label lambda language last latest layout lead
level library license like limit link linkedin linux list live load local locale
location lock log login logout logs look mac main make manage management manifest
map market master match media member menu merge message meta method metric metrics
microsoft middle mobile model module mongo monitor monitoring month most move
mozilla mysql name native netflix network new news next nginx node not note
notification now number nuxt oauth object offer offset one only open openid opera
opt option order orders organization origin other our out output over overlay owner
package page panel panic partner password patch path pattern payment paypal pdf
pending people permission person phone photo php ping pixel place plan platform
player plugin png point policy poll polyfill pong portal position post postgres
preference preview price pricing print privacy private product profile program
progress project prometheus promo property proto provider proxy public publish
purchase push python query queue quote rabbit random rate react reader ready receipt
record redirect redis refresh region register relation relative release remote
remove render report repository request reset resource response rest result review
robot robots role room root route rpc ruby rule run runs rust safari sale sample
save say scan schedule schema scope score screen script search secret section secure
security see segment segments select send server service session sessions setting
settings share she shipping shop show sign signal simple site sitemap size slack
slot small snapshot social socket some source space spans split sport spotify sql
stable stage start startup state static statistic stats status step storage store
stream string stripe style subject submit subscription summary support survey svg
swagger switch sync system table tag take target task team teams template tenant
test text than that the their them theme then there these they think this thread
ticket tiktok time timeout timeouts title token tool topic total trace traces track
traffic transaction transfer trend trigger twilio twitter two type typescript
unknown update upload us use user users valid value variable variant vendor verbose
verify version video view visit vite vue wallet want warning watch way weather web
webhook webpack websocket well what when which who widget wiki will window windows
with word work workflow would xml yaml year you your youtube zone zoom";

static KNOWN_TRIGRAMS: Lazy<HashSet<[u8; 3]>> = Lazy::new(|| {
    let mut known = HashSet::new();
    for word in VOCABULARY.split_whitespace() {
        for window in word.as_bytes().windows(3) {
            known.insert([window[0], window[1], window[2]]);
        }
    }
    known
});

/// True when a mixed-case or digit-bearing alphanumeric chunk is made of
/// letter trigrams that almost never occur in words. Plain lowercase words
/// are never judged.
pub fn is_trigram_bad(chunk: &str) -> bool {
    if chunk.bytes().all(|b| b.is_ascii_lowercase()) {
        return false;
    }

    let lower = chunk.to_ascii_lowercase();
    let trigrams: Vec<[u8; 3]> = lower
        .as_bytes()
        .windows(3)
        .filter(|window| window.iter().all(u8::is_ascii_alphabetic))
        .map(|window| [window[0], window[1], window[2]])
        .collect();
    if trigrams.len() < MIN_TRIGRAMS {
        return false;
    }

    let known = trigrams
        .iter()
        .filter(|trigram| KNOWN_TRIGRAMS.contains(*trigram))
        .count();
    known * KNOWN_SHARE_DIVISOR < trigrams.len()
}
